use contrail_types::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) text: String,
    pub(crate) range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident,
    IntLiteral,
    StringLiteral,
    CharLiteral,
    At,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Dot,
    Ellipsis,
    Star,
    Eq,
    EqEq,
    Bang,
    BangEq,
    Plus,
    PlusPlus,
    Minus,
    MinusMinus,
    Slash,
    Percent,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Tilde,
    Question,
    Colon,
    ColonColon,
    Arrow,
    Unknown,
}

pub(crate) struct Lexer<'a> {
    text: &'a str,
    offset: usize,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(text: &'a str, offset: usize) -> Self {
        Lexer { text, offset, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn bump_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.bump_char();
            true
        } else {
            false
        }
    }

    fn current_offset(&self) -> usize {
        self.offset + self.pos
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
                self.bump_char();
            }

            let rem = self.remaining();
            if rem.starts_with("//") {
                while let Some(c) = self.bump_char() {
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }

            if rem.starts_with("/*") {
                self.bump_char();
                self.bump_char();
                while !self.remaining().is_empty() && !self.remaining().starts_with("*/") {
                    self.bump_char();
                }
                if self.remaining().starts_with("*/") {
                    self.bump_char();
                    self.bump_char();
                }
                continue;
            }

            break;
        }
    }

    fn lex_while(&mut self, out: &mut String, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump_char();
        }
    }

    /// Lexes the rest of a quoted literal; the opening quote was consumed.
    fn lex_quoted(&mut self, quote: char) -> String {
        let mut out = String::new();
        out.push(quote);
        while let Some(c) = self.bump_char() {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = self.bump_char() {
                        out.push(escaped);
                    }
                }
                '\n' => break,
                c if c == quote => break,
                _ => {}
            }
        }
        out
    }

    /// Lexes the rest of a text block; the opening `"""` was consumed.
    fn lex_text_block(&mut self) -> String {
        let mut out = String::from("\"\"\"");
        while let Some(c) = self.bump_char() {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = self.bump_char() {
                    out.push(escaped);
                }
            } else if c == '"' && self.remaining().starts_with("\"\"") {
                self.bump_char();
                self.bump_char();
                out.push_str("\"\"");
                break;
            }
        }
        out
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();
        let start = self.current_offset();
        let ch = self.bump_char()?;

        let punct = |kind: TokenKind| (kind, None::<String>);
        let (kind, text) = match ch {
            '{' => punct(TokenKind::LBrace),
            '}' => punct(TokenKind::RBrace),
            '(' => punct(TokenKind::LParen),
            ')' => punct(TokenKind::RParen),
            '[' => punct(TokenKind::LBracket),
            ']' => punct(TokenKind::RBracket),
            ';' => punct(TokenKind::Semi),
            ',' => punct(TokenKind::Comma),
            '.' if self.remaining().starts_with("..") => {
                self.bump_char();
                self.bump_char();
                punct(TokenKind::Ellipsis)
            }
            '.' => punct(TokenKind::Dot),
            '*' => punct(TokenKind::Star),
            '=' if self.eat('=') => punct(TokenKind::EqEq),
            '=' => punct(TokenKind::Eq),
            '!' if self.eat('=') => punct(TokenKind::BangEq),
            '!' => punct(TokenKind::Bang),
            '+' if self.eat('+') => punct(TokenKind::PlusPlus),
            '+' => punct(TokenKind::Plus),
            '-' if self.eat('-') => punct(TokenKind::MinusMinus),
            '-' if self.eat('>') => punct(TokenKind::Arrow),
            '-' => punct(TokenKind::Minus),
            '/' => punct(TokenKind::Slash),
            '%' => punct(TokenKind::Percent),
            '<' if self.eat('=') => punct(TokenKind::LtEq),
            '<' => punct(TokenKind::Lt),
            // `>>` stays two tokens so nested generic arguments stay balanced.
            '>' if self.eat('=') => punct(TokenKind::GtEq),
            '>' => punct(TokenKind::Gt),
            '&' if self.eat('&') => punct(TokenKind::AmpAmp),
            '&' => punct(TokenKind::Amp),
            '|' if self.eat('|') => punct(TokenKind::PipePipe),
            '|' => punct(TokenKind::Pipe),
            '^' => punct(TokenKind::Caret),
            '~' => punct(TokenKind::Tilde),
            '?' => punct(TokenKind::Question),
            ':' if self.eat(':') => punct(TokenKind::ColonColon),
            ':' => punct(TokenKind::Colon),
            '@' => punct(TokenKind::At),
            '"' if self.remaining().starts_with("\"\"") => {
                self.bump_char();
                self.bump_char();
                (TokenKind::StringLiteral, Some(self.lex_text_block()))
            }
            '"' => (TokenKind::StringLiteral, Some(self.lex_quoted('"'))),
            '\'' => (TokenKind::CharLiteral, Some(self.lex_quoted('\''))),
            c if c.is_ascii_digit() => {
                let mut num = String::new();
                num.push(c);
                self.lex_while(&mut num, |c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                (TokenKind::IntLiteral, Some(num))
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut ident = String::new();
                ident.push(c);
                self.lex_while(&mut ident, |c| c.is_alphanumeric() || c == '_' || c == '$');
                (TokenKind::Ident, Some(ident))
            }
            _ => punct(TokenKind::Unknown),
        };

        let end = self.current_offset();
        let text = text.unwrap_or_else(|| self.text[start - self.offset..end - self.offset].to_string());
        Some(Token {
            kind,
            text,
            range: Span::new(start, end),
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Unescapes the body of a Java string literal token (quotes included).
///
/// Text blocks drop the line break after the opening delimiter. Incidental
/// indentation is kept.
pub(crate) fn unescape_string_literal(text: &str) -> String {
    let inner = match text.strip_prefix("\"\"\"") {
        Some(block) => {
            let block = block.strip_suffix("\"\"\"").unwrap_or(block);
            block.split_once('\n').map_or(block, |(_, rest)| rest)
        }
        None => {
            let inner = text.strip_prefix('"').unwrap_or(text);
            inner.strip_suffix('"').unwrap_or(inner)
        }
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
