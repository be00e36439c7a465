use contrail_types::Span;

use crate::ast;
use crate::lexer::{unescape_string_literal, Lexer, Token, TokenKind};
use crate::ParseError;

const MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
    "default",
    "synchronized",
    "native",
    "transient",
    "volatile",
    "sealed",
    "non",
    "strictfp",
];

const PRIMITIVE_TYPES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub(crate) fn new(text: &str, offset: usize) -> Self {
        Parser {
            tokens: Lexer::new(text, offset).collect(),
            pos: 0,
            end: offset + text.len(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> Vec<ParseError> {
        self.errors
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_n(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|token| token.kind == kind)
    }

    fn nth_kind(&self, n: usize, kind: TokenKind) -> bool {
        self.peek_n(n).is_some_and(|token| token.kind == kind)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek()
            .is_some_and(|token| token.kind == TokenKind::Ident && token.text == keyword)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos)?.clone();
        self.pos += 1;
        Some(tok)
    }

    /// Zero-width span at the current token (or end of input).
    fn here(&self) -> Span {
        let offset = self.peek().map(|t| t.range.start).unwrap_or(self.end);
        Span::new(offset, offset)
    }

    fn last_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map(|t| t.range.end)
            .unwrap_or(0)
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let range = self.peek().map(|t| t.range).unwrap_or_else(|| self.here());
        self.errors.push(ParseError {
            message: message.into(),
            range,
        });
    }

    /// Consumes a token of `kind`. On mismatch nothing is consumed, an error is
    /// recorded and a zero-width placeholder is returned.
    fn expect_kind(&mut self, kind: TokenKind, what: &str) -> Token {
        if self.at_kind(kind) {
            if let Some(tok) = self.bump() {
                return tok;
            }
        }
        self.error_here(format!("expected {what}"));
        Token {
            kind,
            text: String::new(),
            range: self.here(),
        }
    }

    fn expect_ident(&mut self) -> Token {
        self.expect_kind(TokenKind::Ident, "identifier")
    }

    pub(crate) fn parse_compilation_unit(&mut self) -> ast::CompilationUnit {
        let start = self.peek().map(|t| t.range.start).unwrap_or(0);

        while self.at_keyword("package") || self.at_keyword("import") {
            while !self.is_eof() && !self.at_kind(TokenKind::Semi) {
                self.bump();
            }
            self.expect_kind(TokenKind::Semi, "`;`");
        }

        let mut types = Vec::new();
        while !self.is_eof() {
            if let Some(decl) = self.parse_type_decl() {
                types.push(decl);
            } else {
                self.error_here("expected type declaration");
                self.bump();
            }
        }

        ast::CompilationUnit {
            types,
            range: Span::new(start, self.end),
        }
    }

    fn parse_qualified_name(&mut self) -> (String, Span) {
        let first = self.expect_ident();
        let start = first.range.start;
        let mut end = first.range.end;
        let mut parts = vec![first.text];

        while self.at_kind(TokenKind::Dot) && self.nth_kind(1, TokenKind::Ident) {
            self.bump();
            let part = self.expect_ident();
            end = part.range.end;
            parts.push(part.text);
        }

        (parts.join("."), Span::new(start, end))
    }

    fn at_annotation_type_decl(&self) -> bool {
        self.at_kind(TokenKind::At)
            && self
                .peek_n(1)
                .is_some_and(|t| t.kind == TokenKind::Ident && t.text == "interface")
    }

    fn parse_type_decl(&mut self) -> Option<ast::TypeDecl> {
        let start_pos = self.pos;
        let start = self.peek()?.range.start;

        self.parse_modifiers_and_annotations();

        let kind = if self.at_annotation_type_decl() {
            self.bump();
            ast::TypeKind::Annotation
        } else {
            match self.peek().map(|t| t.text.as_str()) {
                Some("class") => ast::TypeKind::Class,
                Some("interface") => ast::TypeKind::Interface,
                Some("enum") => ast::TypeKind::Enum,
                Some("record") => ast::TypeKind::Record,
                _ => {
                    self.pos = start_pos;
                    return None;
                }
            }
        };

        self.bump();
        let name = self.expect_ident();

        let (members, body_range, end) =
            self.parse_type_body(name.text.as_str(), kind == ast::TypeKind::Enum);

        Some(ast::TypeDecl {
            kind,
            name: name.text,
            range: Span::new(start, end),
            body_range,
            members,
        })
    }

    /// Skips modifiers, collecting any annotations seen along the way.
    fn parse_modifiers_and_annotations(&mut self) -> Vec<ast::Annotation> {
        let mut annotations = Vec::new();
        loop {
            if self.at_kind(TokenKind::At) {
                if self.at_annotation_type_decl() {
                    break;
                }
                annotations.push(self.parse_annotation());
                continue;
            }

            if self
                .peek()
                .is_some_and(|tok| tok.kind == TokenKind::Ident && MODIFIERS.contains(&tok.text.as_str()))
            {
                if self.at_keyword("non")
                    && self.nth_kind(1, TokenKind::Minus)
                    && self
                        .peek_n(2)
                        .is_some_and(|t| t.kind == TokenKind::Ident && t.text == "sealed")
                {
                    self.bump();
                    self.bump();
                    self.bump();
                    continue;
                }
                if self.at_keyword("static") && self.nth_kind(1, TokenKind::LBrace) {
                    break;
                }
                self.bump();
                continue;
            }

            break;
        }
        annotations
    }

    fn parse_annotation(&mut self) -> ast::Annotation {
        let at = self.expect_kind(TokenKind::At, "`@`");
        let (name, name_range) = self.parse_qualified_name();
        let mut end = name_range.end;
        let mut args = Vec::new();

        if self.at_kind(TokenKind::LParen) {
            self.bump();
            while !self.is_eof() && !self.at_kind(TokenKind::RParen) {
                args.push(self.parse_annotation_arg());
                if self.at_kind(TokenKind::Comma) {
                    self.bump();
                }
            }
            end = self.expect_kind(TokenKind::RParen, "`)`").range.end.max(end);
        }

        ast::Annotation {
            name,
            args,
            range: Span::new(at.range.start, end),
        }
    }

    fn parse_annotation_arg(&mut self) -> ast::AnnotationArg {
        let start = self.here().start;
        let name = if self.at_kind(TokenKind::Ident) && self.nth_kind(1, TokenKind::Eq) {
            let name = self.bump().map(|t| t.text);
            self.bump();
            name
        } else {
            None
        };

        let single_string = self.at_kind(TokenKind::StringLiteral)
            && (self.nth_kind(1, TokenKind::Comma) || self.nth_kind(1, TokenKind::RParen));
        let value = if single_string {
            let tok = self.bump().map(|t| t.text).unwrap_or_default();
            ast::AnnotationValue::String(unescape_string_literal(&tok))
        } else {
            let mut parts = Vec::new();
            let mut depth = 0usize;
            while let Some(tok) = self.peek() {
                match tok.kind {
                    TokenKind::Comma | TokenKind::RParen if depth == 0 => break,
                    TokenKind::LParen | TokenKind::LBrace => depth += 1,
                    TokenKind::RParen | TokenKind::RBrace => depth = depth.saturating_sub(1),
                    _ => {}
                }
                parts.push(tok.text.clone());
                self.bump();
            }
            ast::AnnotationValue::Other(parts.join(" "))
        };

        ast::AnnotationArg {
            name,
            value,
            range: Span::new(start, self.last_end().max(start)),
        }
    }

    fn parse_type_body(
        &mut self,
        type_name: &str,
        is_enum: bool,
    ) -> (Vec<ast::MemberDecl>, Span, usize) {
        while !self.at_kind(TokenKind::LBrace) && !self.is_eof() {
            self.bump();
        }
        let lbrace = self.expect_kind(TokenKind::LBrace, "`{`");
        let body_start = lbrace.range.start;

        if is_enum {
            self.skip_enum_constants();
        }

        let mut members = Vec::new();
        while !self.is_eof() && !self.at_kind(TokenKind::RBrace) {
            let before = self.pos;
            if let Some(member) = self.parse_member_decl(type_name) {
                members.push(member);
            }
            if self.pos == before {
                self.bump();
            }
        }

        let rbrace = self.expect_kind(TokenKind::RBrace, "`}`");
        let body_range = Span::new(body_start, rbrace.range.end);
        (members, body_range, rbrace.range.end)
    }

    fn skip_enum_constants(&mut self) {
        if self.at_kind(TokenKind::Semi) {
            self.bump();
            return;
        }

        loop {
            if self.at_kind(TokenKind::Semi) {
                self.bump();
                break;
            }
            if self.at_kind(TokenKind::RBrace) {
                break;
            }

            self.parse_modifiers_and_annotations();
            if !self.at_kind(TokenKind::Ident) {
                break;
            }
            self.bump();

            if self.at_kind(TokenKind::LParen) {
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
            }
            if self.at_kind(TokenKind::LBrace) {
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
            }

            if self.at_kind(TokenKind::Comma) {
                self.bump();
                continue;
            }
            if self.at_kind(TokenKind::Semi) {
                self.bump();
                break;
            }
            if self.at_kind(TokenKind::RBrace) {
                break;
            }

            self.bump();
        }
    }

    pub(crate) fn parse_member_decl(&mut self, enclosing_type: &str) -> Option<ast::MemberDecl> {
        let start = self.peek()?.range.start;
        let annotations = self.parse_modifiers_and_annotations();

        // Generic method/constructor type parameters: `<T extends ...>`
        if self.at_kind(TokenKind::Lt) {
            self.skip_balanced(TokenKind::Lt, TokenKind::Gt);
        }

        if self.at_keyword("static") && self.nth_kind(1, TokenKind::LBrace) {
            self.bump();
            let body = self.parse_block();
            let range = Span::new(start, body.range.end);
            return Some(ast::MemberDecl::Initializer(ast::InitializerDecl {
                is_static: true,
                body,
                range,
            }));
        }

        if self.at_kind(TokenKind::LBrace) {
            let body = self.parse_block();
            let range = Span::new(start, body.range.end);
            return Some(ast::MemberDecl::Initializer(ast::InitializerDecl {
                is_static: false,
                body,
                range,
            }));
        }

        let is_nested_type = self.at_annotation_type_decl()
            || self.peek().is_some_and(|ty| {
                ty.kind == TokenKind::Ident
                    && matches!(ty.text.as_str(), "class" | "interface" | "enum" | "record")
            });
        if is_nested_type {
            if let Some(decl) = self.parse_type_decl() {
                return Some(ast::MemberDecl::Type(decl));
            }
        }

        if !enclosing_type.is_empty()
            && self.at_keyword(enclosing_type)
            && self.nth_kind(1, TokenKind::LParen)
        {
            let name = self.expect_ident();
            let params = self.parse_param_list();
            self.skip_throws_clause();
            let body = self.parse_block();
            let range = Span::new(start, body.range.end);
            return Some(ast::MemberDecl::Constructor(ast::ConstructorDecl {
                name: name.text,
                name_range: name.range,
                params,
                body,
                range,
            }));
        }

        let return_ty = self.parse_type_ref()?;
        let name = self.expect_ident();

        if self.at_kind(TokenKind::LParen) {
            let params = self.parse_param_list();
            self.skip_throws_clause();
            if self.at_keyword("default") {
                // Annotation type element default value: `int value() default 1;`
                while !self.is_eof() && !self.at_kind(TokenKind::Semi) {
                    self.bump();
                }
            }

            let body = if self.at_kind(TokenKind::LBrace) {
                Some(self.parse_block())
            } else {
                self.expect_kind(TokenKind::Semi, "`;` or method body");
                None
            };

            return Some(ast::MemberDecl::Method(ast::MethodDecl {
                annotations,
                return_ty,
                name: name.text,
                name_range: name.range,
                params,
                body,
                range: Span::new(start, self.last_end().max(start)),
            }));
        }

        while !self.is_eof() && !self.at_kind(TokenKind::Semi) {
            if self.at_kind(TokenKind::LBrace) {
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                continue;
            }
            self.bump();
        }
        let semi = self.expect_kind(TokenKind::Semi, "`;`");
        Some(ast::MemberDecl::Field(ast::FieldDecl {
            ty: return_ty,
            name: name.text,
            name_range: name.range,
            range: Span::new(start, semi.range.end),
        }))
    }

    fn skip_throws_clause(&mut self) {
        if !self.at_keyword("throws") {
            return;
        }
        self.bump();
        while !self.is_eof() && !self.at_kind(TokenKind::LBrace) && !self.at_kind(TokenKind::Semi) {
            self.bump();
        }
    }

    fn parse_type_ref(&mut self) -> Option<ast::TypeRef> {
        if !self.at_kind(TokenKind::Ident) {
            return None;
        }
        let first = self.expect_ident();
        let start = first.range.start;
        let mut end = first.range.end;
        let mut text = first.text;

        while self.at_kind(TokenKind::Dot) && self.nth_kind(1, TokenKind::Ident) {
            self.bump();
            let part = self.expect_ident();
            text.push('.');
            text.push_str(&part.text);
            end = part.range.end;
        }

        if self.at_kind(TokenKind::Lt) {
            let (generic_text, generic_end) = self.collect_balanced(TokenKind::Lt, TokenKind::Gt);
            text.push_str(&generic_text);
            end = generic_end;
        }

        while self.at_kind(TokenKind::LBracket) && self.nth_kind(1, TokenKind::RBracket) {
            self.bump();
            let rb = self.expect_kind(TokenKind::RBracket, "`]`");
            text.push_str("[]");
            end = rb.range.end;
        }

        Some(ast::TypeRef {
            text,
            range: Span::new(start, end),
        })
    }

    fn parse_param_list(&mut self) -> Vec<ast::ParamDecl> {
        self.expect_kind(TokenKind::LParen, "`(`");
        let mut params = Vec::new();
        while !self.is_eof() && !self.at_kind(TokenKind::RParen) {
            self.skip_variable_modifiers_and_annotations();
            if let Some(mut ty) = self.parse_type_ref() {
                if self.at_kind(TokenKind::Ellipsis) {
                    let dots = self.bump().map(|t| t.range.end).unwrap_or(ty.range.end);
                    ty.text.push_str("...");
                    ty.range = Span::new(ty.range.start, dots);
                }

                let name = self.expect_ident();
                let range = Span::new(ty.range.start, name.range.end);
                params.push(ast::ParamDecl {
                    ty,
                    name: name.text,
                    name_range: name.range,
                    range,
                });
            } else {
                self.error_here("expected parameter");
                self.bump();
            }

            if self.at_kind(TokenKind::Comma) {
                self.bump();
            }
        }
        self.expect_kind(TokenKind::RParen, "`)`");
        params
    }

    fn skip_variable_modifiers_and_annotations(&mut self) {
        loop {
            if self.at_kind(TokenKind::At) {
                self.parse_annotation();
                continue;
            }
            if self.at_keyword("final") {
                self.bump();
                continue;
            }
            break;
        }
    }

    // === Statements ===

    pub(crate) fn parse_block(&mut self) -> ast::Block {
        let lbrace = self.expect_kind(TokenKind::LBrace, "`{`");
        let start = lbrace.range.start;
        let mut statements = Vec::new();
        while !self.is_eof() && !self.at_kind(TokenKind::RBrace) {
            let before = self.pos;
            if let Some(stmt) = self.parse_stmt() {
                statements.push(stmt);
            }
            if self.pos == before {
                self.bump();
            }
        }
        let rbrace = self.expect_kind(TokenKind::RBrace, "`}`");
        ast::Block {
            statements,
            range: Span::new(start, rbrace.range.end.max(start)),
        }
    }

    fn parse_stmt(&mut self) -> Option<ast::Stmt> {
        let start = self.peek()?.range.start;

        if self.at_kind(TokenKind::Semi) {
            let semi = self.bump()?;
            return Some(ast::Stmt::Empty(semi.range));
        }

        if self.at_kind(TokenKind::LBrace) {
            return Some(ast::Stmt::Block(self.parse_block()));
        }

        let keyword = self
            .peek()
            .filter(|t| t.kind == TokenKind::Ident)
            .map(|t| t.text.clone())
            .unwrap_or_default();
        match keyword.as_str() {
            "return" => {
                self.bump();
                let expr = if self.at_kind(TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expr())
                };
                let semi = self.expect_kind(TokenKind::Semi, "`;`");
                return Some(ast::Stmt::Return(ast::ReturnStmt {
                    expr,
                    range: Span::new(start, semi.range.end),
                }));
            }
            "throw" => {
                self.bump();
                let expr = self.parse_expr();
                let semi = self.expect_kind(TokenKind::Semi, "`;`");
                return Some(ast::Stmt::Throw(ast::ThrowStmt {
                    expr,
                    range: Span::new(start, semi.range.end),
                }));
            }
            "if" => {
                self.bump();
                let condition = self.parse_paren_condition();
                let then_branch = self.parse_sub_stmt();
                let else_branch = if self.at_keyword("else") {
                    self.bump();
                    Some(self.parse_sub_stmt())
                } else {
                    None
                };
                return Some(ast::Stmt::If(ast::IfStmt {
                    condition,
                    then_branch,
                    else_branch,
                    range: Span::new(start, self.last_end().max(start)),
                }));
            }
            "assert" => {
                self.bump();
                let condition = self.parse_expr();
                let message = if self.at_kind(TokenKind::Colon) {
                    self.bump();
                    Some(self.parse_expr())
                } else {
                    None
                };
                let semi = self.expect_kind(TokenKind::Semi, "`;`");
                return Some(ast::Stmt::Assert(ast::AssertStmt {
                    condition,
                    message,
                    range: Span::new(start, semi.range.end),
                }));
            }
            "while" => {
                self.bump();
                let condition = self.parse_paren_condition();
                let body = self.parse_sub_stmt();
                return Some(ast::Stmt::While(ast::WhileStmt {
                    condition,
                    body,
                    range: Span::new(start, self.last_end().max(start)),
                }));
            }
            "for" | "do" | "switch" | "try" | "synchronized" | "break" | "continue" | "yield" => {
                self.skip_opaque_stmt(&keyword);
                return Some(ast::Stmt::Opaque(ast::OpaqueStmt {
                    keyword,
                    range: Span::new(start, self.last_end().max(start)),
                }));
            }
            _ => {}
        }

        if let Some(local) = self.try_parse_local_var_stmt() {
            return Some(local);
        }

        let expr = self.parse_expr();
        let semi = self.expect_kind(TokenKind::Semi, "`;`");
        Some(ast::Stmt::Expr(ast::ExprStmt {
            range: Span::new(start, semi.range.end.max(expr.range().end)),
            expr,
        }))
    }

    fn parse_sub_stmt(&mut self) -> Box<ast::Stmt> {
        let here = self.here();
        Box::new(self.parse_stmt().unwrap_or_else(|| {
            self.error_here("expected statement");
            ast::Stmt::Empty(here)
        }))
    }

    fn parse_paren_condition(&mut self) -> ast::Expr {
        self.expect_kind(TokenKind::LParen, "`(`");
        let condition = self.parse_expr();
        self.expect_kind(TokenKind::RParen, "`)`");
        condition
    }

    fn skip_opaque_stmt(&mut self, keyword: &str) {
        self.bump();
        match keyword {
            "for" | "switch" | "synchronized" => {
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
                if keyword == "for" {
                    self.parse_sub_stmt();
                } else {
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                }
            }
            "do" => {
                self.parse_sub_stmt();
                if self.at_keyword("while") {
                    self.bump();
                    self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
                }
                self.expect_kind(TokenKind::Semi, "`;`");
            }
            "try" => {
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                while self.at_keyword("catch") {
                    self.bump();
                    self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                }
                if self.at_keyword("finally") {
                    self.bump();
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                }
            }
            _ => {
                while !self.is_eof()
                    && !self.at_kind(TokenKind::Semi)
                    && !self.at_kind(TokenKind::RBrace)
                {
                    self.bump();
                }
                self.expect_kind(TokenKind::Semi, "`;`");
            }
        }
    }

    fn try_parse_local_var_stmt(&mut self) -> Option<ast::Stmt> {
        let start_pos = self.pos;
        let start = self.peek()?.range.start;
        let errors_before = self.errors.len();

        self.skip_variable_modifiers_and_annotations();
        let Some(ty) = self.parse_type_ref() else {
            self.pos = start_pos;
            self.errors.truncate(errors_before);
            return None;
        };

        if !self.at_kind(TokenKind::Ident) {
            self.pos = start_pos;
            self.errors.truncate(errors_before);
            return None;
        }
        let name = self.expect_ident();

        if !self.at_kind(TokenKind::Eq) && !self.at_kind(TokenKind::Semi) {
            self.pos = start_pos;
            self.errors.truncate(errors_before);
            return None;
        }

        let mut initializer = None;
        if self.at_kind(TokenKind::Eq) {
            self.bump();
            initializer = Some(self.parse_expr());
        }
        let semi = self.expect_kind(TokenKind::Semi, "`;`");
        Some(ast::Stmt::LocalVar(ast::LocalVarStmt {
            ty,
            name: name.text,
            name_range: name.range,
            initializer,
            range: Span::new(start, semi.range.end),
        }))
    }

    // === Expressions ===

    pub(crate) fn parse_expr(&mut self) -> ast::Expr {
        if let Some(lambda) = self.try_parse_lambda_expr() {
            return lambda;
        }
        let target = self.parse_conditional_expr();
        if !self.at_kind(TokenKind::Eq) {
            return target;
        }
        self.bump();
        let value = self.parse_expr();
        let range = target.range().cover(value.range());
        ast::Expr::Assign(ast::AssignExpr {
            target: Box::new(target),
            value: Box::new(value),
            range,
        })
    }

    fn parse_conditional_expr(&mut self) -> ast::Expr {
        let condition = self.parse_binary_expr(0);
        if !self.at_kind(TokenKind::Question) {
            return condition;
        }
        self.bump();
        let then_expr = self.parse_expr();
        self.expect_kind(TokenKind::Colon, "`:`");
        let else_expr = self.parse_conditional_expr();
        let range = condition.range().cover(else_expr.range());
        ast::Expr::Conditional(ast::ConditionalExpr {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            range,
        })
    }

    fn binary_op(&self) -> Option<(ast::BinaryOp, u8)> {
        let op = match self.peek()?.kind {
            TokenKind::PipePipe => (ast::BinaryOp::OrOr, 1),
            TokenKind::AmpAmp => (ast::BinaryOp::AndAnd, 2),
            TokenKind::Pipe => (ast::BinaryOp::BitOr, 3),
            TokenKind::Caret => (ast::BinaryOp::BitXor, 4),
            TokenKind::Amp => (ast::BinaryOp::BitAnd, 5),
            TokenKind::EqEq => (ast::BinaryOp::EqEq, 6),
            TokenKind::BangEq => (ast::BinaryOp::NotEq, 6),
            TokenKind::Lt => (ast::BinaryOp::Lt, 7),
            TokenKind::Gt => (ast::BinaryOp::Gt, 7),
            TokenKind::LtEq => (ast::BinaryOp::LtEq, 7),
            TokenKind::GtEq => (ast::BinaryOp::GtEq, 7),
            TokenKind::Plus => (ast::BinaryOp::Add, 9),
            TokenKind::Minus => (ast::BinaryOp::Sub, 9),
            TokenKind::Star => (ast::BinaryOp::Mul, 10),
            TokenKind::Slash => (ast::BinaryOp::Div, 10),
            TokenKind::Percent => (ast::BinaryOp::Rem, 10),
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> ast::Expr {
        const INSTANCEOF_PREC: u8 = 7;

        let mut lhs = self.parse_unary_expr();
        loop {
            if self.at_keyword("instanceof") {
                if INSTANCEOF_PREC < min_prec {
                    break;
                }
                self.bump();
                if self.at_keyword("final") {
                    self.bump();
                }
                let ty = self.parse_type_ref().unwrap_or_else(|| {
                    self.error_here("expected type after `instanceof`");
                    ast::TypeRef {
                        text: String::new(),
                        range: self.here(),
                    }
                });
                // Pattern binding: `o instanceof String s`.
                if self.at_kind(TokenKind::Ident) && !self.at_keyword("instanceof") {
                    self.bump();
                }
                let range = Span::new(lhs.range().start, self.last_end().max(ty.range.end));
                lhs = ast::Expr::InstanceOf(ast::InstanceOfExpr {
                    expr: Box::new(lhs),
                    ty,
                    range,
                });
                continue;
            }

            let Some((op, prec)) = self.binary_op() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.bump();
            let rhs = self.parse_binary_expr(prec + 1);
            let range = lhs.range().cover(rhs.range());
            lhs = ast::Expr::Binary(ast::BinaryExpr {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                range,
            });
        }
        lhs
    }

    /// `x -> ...` or `(params) -> ...`. The lambda is kept opaque.
    fn try_parse_lambda_expr(&mut self) -> Option<ast::Expr> {
        let params_len = match self.peek()?.kind {
            TokenKind::Ident => 1,
            TokenKind::LParen => self.balanced_len(TokenKind::LParen, TokenKind::RParen)?,
            _ => return None,
        };
        if !self.nth_kind(params_len, TokenKind::Arrow) {
            return None;
        }

        let start = self.here().start;
        for _ in 0..=params_len {
            self.bump();
        }
        if self.at_kind(TokenKind::LBrace) {
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
        } else {
            self.parse_expr();
        }
        Some(ast::Expr::Lambda(Span::new(start, self.last_end().max(start))))
    }

    /// `(T) operand`. Backtracks unless the parenthesized tokens form a type
    /// and the next token can start the operand.
    fn try_parse_cast_expr(&mut self) -> Option<ast::Expr> {
        let start_pos = self.pos;
        let errors_before = self.errors.len();
        let lparen = self.bump()?;

        let Some(ty) = self.parse_cast_type() else {
            self.pos = start_pos;
            self.errors.truncate(errors_before);
            return None;
        };
        self.bump();

        let expr = match self.try_parse_lambda_expr() {
            Some(lambda) => lambda,
            None => self.parse_unary_expr(),
        };
        let range = Span::new(lparen.range.start, expr.range().end.max(lparen.range.end));
        Some(ast::Expr::Cast(ast::CastExpr {
            ty,
            expr: Box::new(expr),
            range,
        }))
    }

    /// Parses the type of a cast up to, not including, the `)`.
    fn parse_cast_type(&mut self) -> Option<ast::TypeRef> {
        let mut ty = self.parse_type_ref()?;
        // Intersection casts: `(A & B) x`.
        while self.at_kind(TokenKind::Amp) {
            self.bump();
            let bound = self.parse_type_ref()?;
            ty.text.push_str(" & ");
            ty.text.push_str(&bound.text);
            ty.range = ty.range.cover(bound.range);
        }
        if !self.at_kind(TokenKind::RParen) {
            return None;
        }

        let next = self.peek_n(1)?;
        let starts_operand = match next.kind {
            TokenKind::Ident => next.text != "instanceof",
            TokenKind::IntLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::LParen
            | TokenKind::Bang
            | TokenKind::Tilde => true,
            // `(a) - b` is a subtraction unless `a` names a primitive type.
            TokenKind::Plus | TokenKind::Minus | TokenKind::PlusPlus | TokenKind::MinusMinus => {
                PRIMITIVE_TYPES.contains(&ty.text.as_str())
            }
            _ => false,
        };
        starts_operand.then_some(ty)
    }

    fn parse_unary_expr(&mut self) -> ast::Expr {
        if self.at_kind(TokenKind::LParen) {
            if let Some(cast) = self.try_parse_cast_expr() {
                return cast;
            }
        }
        let op = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Bang) => ast::UnaryOp::Not,
            Some(TokenKind::Minus) => ast::UnaryOp::Neg,
            Some(TokenKind::Plus) => ast::UnaryOp::Plus,
            Some(TokenKind::Tilde) => ast::UnaryOp::BitNot,
            Some(TokenKind::PlusPlus) => ast::UnaryOp::PreInc,
            Some(TokenKind::MinusMinus) => ast::UnaryOp::PreDec,
            _ => return self.parse_postfix_expr(),
        };
        let start = self.here().start;
        self.bump();
        let operand = self.parse_unary_expr();
        let range = Span::new(start, operand.range().end.max(start));
        ast::Expr::Unary(ast::UnaryExpr {
            op,
            operand: Box::new(operand),
            range,
        })
    }

    fn parse_postfix_expr(&mut self) -> ast::Expr {
        let mut expr = self.parse_primary_expr();
        loop {
            match self.peek().map(|t| t.kind) {
                Some(TokenKind::Dot) if self.nth_kind(1, TokenKind::Ident) => {
                    self.bump();
                    let name = self.expect_ident();
                    let range = Span::new(expr.range().start, name.range.end);
                    expr = ast::Expr::FieldAccess(ast::FieldAccessExpr {
                        receiver: Box::new(expr),
                        name: name.text,
                        name_range: name.range,
                        range,
                    });
                }
                Some(TokenKind::LParen) => {
                    let (args, end) = self.parse_arg_list();
                    let range = Span::new(expr.range().start, end);
                    expr = ast::Expr::Call(ast::CallExpr {
                        callee: Box::new(expr),
                        args,
                        range,
                    });
                }
                Some(TokenKind::LBracket) => {
                    self.bump();
                    let index = self.parse_expr();
                    let rbracket = self.expect_kind(TokenKind::RBracket, "`]`");
                    let range = Span::new(expr.range().start, rbracket.range.end);
                    expr = ast::Expr::ArrayAccess(ast::ArrayAccessExpr {
                        array: Box::new(expr),
                        index: Box::new(index),
                        range,
                    });
                }
                Some(TokenKind::ColonColon) => {
                    self.bump();
                    let name = self.expect_ident();
                    let range = Span::new(expr.range().start, self.last_end().max(name.range.end));
                    expr = ast::Expr::MethodRef(ast::MethodRefExpr {
                        receiver: Box::new(expr),
                        name: name.text,
                        range,
                    });
                }
                Some(kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus)) => {
                    let tok = self.bump().map(|t| t.range).unwrap_or_else(|| self.here());
                    let op = if kind == TokenKind::PlusPlus {
                        ast::UnaryOp::PostInc
                    } else {
                        ast::UnaryOp::PostDec
                    };
                    let range = expr.range().cover(tok);
                    expr = ast::Expr::Unary(ast::UnaryExpr {
                        op,
                        operand: Box::new(expr),
                        range,
                    });
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary_expr(&mut self) -> ast::Expr {
        let Some(kind) = self.peek().map(|t| t.kind) else {
            self.error_here("expected expression");
            return ast::Expr::Missing(self.here());
        };

        match kind {
            TokenKind::Ident => {
                if self.at_keyword("new") {
                    return self.parse_new_expr();
                }
                let Some(tok) = self.bump() else {
                    return ast::Expr::Missing(self.here());
                };
                match tok.text.as_str() {
                    "true" | "false" => ast::Expr::BoolLiteral(ast::BoolLiteralExpr {
                        value: tok.text == "true",
                        range: tok.range,
                    }),
                    "null" => ast::Expr::NullLiteral(tok.range),
                    "this" => ast::Expr::This(tok.range),
                    _ => ast::Expr::Name(ast::NameExpr {
                        name: tok.text,
                        range: tok.range,
                    }),
                }
            }
            TokenKind::IntLiteral | TokenKind::StringLiteral | TokenKind::CharLiteral => {
                let Some(tok) = self.bump() else {
                    return ast::Expr::Missing(self.here());
                };
                let lit = ast::LiteralExpr {
                    value: tok.text,
                    range: tok.range,
                };
                match kind {
                    TokenKind::IntLiteral => ast::Expr::IntLiteral(lit),
                    TokenKind::StringLiteral => ast::Expr::StringLiteral(lit),
                    _ => ast::Expr::CharLiteral(lit),
                }
            }
            TokenKind::LParen => {
                let lparen = self.expect_kind(TokenKind::LParen, "`(`");
                let inner = self.parse_expr();
                let rparen = self.expect_kind(TokenKind::RParen, "`)`");
                ast::Expr::Paren(ast::ParenExpr {
                    expr: Box::new(inner),
                    range: Span::new(lparen.range.start, rparen.range.end.max(lparen.range.end)),
                })
            }
            // Closing delimiters belong to an enclosing construct.
            TokenKind::RParen
            | TokenKind::RBrace
            | TokenKind::RBracket
            | TokenKind::Semi
            | TokenKind::Comma
            | TokenKind::Colon => {
                self.error_here("expected expression");
                ast::Expr::Missing(self.here())
            }
            _ => {
                self.error_here("expected expression");
                let range = self.bump().map(|t| t.range).unwrap_or_else(|| self.here());
                ast::Expr::Missing(range)
            }
        }
    }

    fn parse_new_expr(&mut self) -> ast::Expr {
        let kw = self.expect_ident();
        let ty = self.parse_type_ref().unwrap_or_else(|| {
            self.error_here("expected type after `new`");
            ast::TypeRef {
                text: String::new(),
                range: self.here(),
            }
        });

        let mut args = Vec::new();
        if self.at_kind(TokenKind::LParen) {
            args = self.parse_arg_list().0;
        }
        while self.at_kind(TokenKind::LBracket) {
            self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket);
        }
        if self.at_kind(TokenKind::LBrace) {
            // Anonymous class body or array initializer.
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
        }

        ast::Expr::New(ast::NewExpr {
            ty,
            args,
            range: Span::new(kw.range.start, self.last_end().max(kw.range.end)),
        })
    }

    fn parse_arg_list(&mut self) -> (Vec<ast::Expr>, usize) {
        let lparen = self.expect_kind(TokenKind::LParen, "`(`");
        let mut args = Vec::new();
        while !self.is_eof() && !self.at_kind(TokenKind::RParen) {
            let before = self.pos;
            args.push(self.parse_expr());
            if self.at_kind(TokenKind::Comma) {
                self.bump();
            } else if self.pos == before {
                self.bump();
            }
        }
        let rparen = self.expect_kind(TokenKind::RParen, "`)`");
        (args, rparen.range.end.max(lparen.range.end))
    }

    /// Token count of the balanced group that starts at the current token.
    fn balanced_len(&self, open: TokenKind, close: TokenKind) -> Option<usize> {
        let mut depth = 0usize;
        for (n, tok) in self.tokens.get(self.pos..)?.iter().enumerate() {
            if tok.kind == open {
                depth += 1;
            } else if tok.kind == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(n + 1);
                }
            }
        }
        None
    }

    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) {
        if !self.at_kind(open) {
            return;
        }
        self.bump();
        let mut depth = 1usize;
        while !self.is_eof() && depth > 0 {
            match self.peek().map(|t| t.kind) {
                Some(k) if k == open => depth += 1,
                Some(k) if k == close => depth -= 1,
                _ => {}
            }
            self.bump();
        }
    }

    fn collect_balanced(&mut self, open: TokenKind, close: TokenKind) -> (String, usize) {
        let mut text = String::new();
        let mut end = self.here().end;
        let mut depth = 0usize;
        while let Some(tok) = self.bump() {
            if tok.kind == open {
                depth += 1;
            } else if tok.kind == close {
                depth = depth.saturating_sub(1);
            }
            text.push_str(&tok.text);
            if tok.kind == TokenKind::Comma {
                text.push(' ');
            }
            end = tok.range.end;
            if depth == 0 {
                break;
            }
        }
        (text, end)
    }
}
