//! Contract inference over a method body.
//!
//! A small abstract interpreter: states are [`ArgConstraints`] vectors, and
//! evaluating an expression or statement under a set of states yields the
//! contracts that hold on each path. Only the shapes listed on
//! [`Interpreter::evaluate_expr`] and [`Interpreter::evaluate_stmts`] are
//! understood; everything else contributes nothing.

use contrail_hir::{BinaryOp, Body, Expr, ExprId, LiteralKind, Method, Stmt, StmtId, UnaryOp};

use crate::constraint::{ArgConstraints, ValueConstraint};
use crate::contract::MethodContract;

/// Live-state count above which an expression is not analysed.
pub const DEFAULT_MAX_STATES: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceConfig {
    /// Expressions evaluated under more states than this yield no contracts.
    pub max_states: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_states: DEFAULT_MAX_STATES,
        }
    }
}

/// Maps expressions to parameter indices.
pub trait ParamResolver {
    fn resolve_param(&self, body: &Body, expr: ExprId) -> Option<usize>;
}

/// Only an unqualified name equal to a parameter name resolves; `this.x`,
/// fields and locals do not.
impl ParamResolver for Method {
    fn resolve_param(&self, body: &Body, expr: ExprId) -> Option<usize> {
        match &body.exprs[expr] {
            Expr::Name { name, .. } => self.param_index(name),
            _ => None,
        }
    }
}

/// Infers contracts for `method` with the default configuration.
#[must_use]
pub fn infer_contracts(method: &Method) -> Vec<MethodContract> {
    infer_contracts_with(method, &InferenceConfig::default())
}

#[must_use]
pub fn infer_contracts_with(method: &Method, config: &InferenceConfig) -> Vec<MethodContract> {
    let span = tracing::debug_span!("infer_contracts", method = %method.name);
    let _guard = span.enter();

    let Some(body) = method.body.as_ref() else {
        tracing::trace!("no body");
        return Vec::new();
    };
    let statements = body.statements();
    if statements.is_empty() {
        return Vec::new();
    }

    let interpreter = Interpreter::new(body, method, config.max_states);
    let initial = vec![ArgConstraints::any(method.params.len())];
    let contracts = interpreter.evaluate_stmts(initial, statements);
    tracing::debug!(contracts = contracts.len(), "inferred contracts");
    contracts
}

pub struct Interpreter<'a, R: ?Sized> {
    body: &'a Body,
    resolver: &'a R,
    max_states: usize,
}

impl<'a, R: ParamResolver + ?Sized> Interpreter<'a, R> {
    pub fn new(body: &'a Body, resolver: &'a R, max_states: usize) -> Self {
        Self {
            body,
            resolver,
            max_states,
        }
    }

    /// Contracts of `expr` evaluated under each of `states`, in order:
    ///
    /// * `p == lit` / `p != lit` (either operand order): per state, the
    ///   state pinned to `lit` then pinned to its negation.
    /// * `&&` / `||`: short-circuit fold over the operands.
    /// * `c ? a : b`: `a` under the TRUE states of `c`, then `b` under the
    ///   FALSE states.
    /// * `(e)` and `!e`; `!` keeps only boolean results, negated.
    /// * `p instanceof T`: the state with `p` null, returning false.
    /// * `true`, `false`, `null` literals.
    /// * A bare parameter.
    pub fn evaluate_expr(&self, states: &[ArgConstraints], expr: ExprId) -> Vec<MethodContract> {
        if states.is_empty() {
            return Vec::new();
        }
        if states.len() > self.max_states {
            tracing::debug!(states = states.len(), "too many states, giving up on expression");
            return Vec::new();
        }

        match &self.body.exprs[expr] {
            Expr::Polyadic { op, operands, .. } => match op {
                BinaryOp::Eq | BinaryOp::NotEq if operands.len() == 2 => {
                    self.equality(states, operands[0], operands[1], *op == BinaryOp::Eq)
                }
                BinaryOp::And => self.short_circuit(states, operands, ValueConstraint::False),
                BinaryOp::Or => self.short_circuit(states, operands, ValueConstraint::True),
                _ => Vec::new(),
            },
            Expr::Conditional {
                condition,
                then_expr,
                else_expr,
                ..
            } => {
                let results = self.evaluate_expr(states, *condition);
                let mut out =
                    self.evaluate_expr(&returning(&results, ValueConstraint::True), *then_expr);
                out.extend(
                    self.evaluate_expr(&returning(&results, ValueConstraint::False), *else_expr),
                );
                out
            }
            Expr::Paren { expr, .. } => self.evaluate_expr(states, *expr),
            Expr::Unary {
                op: UnaryOp::Not,
                expr,
                ..
            } => self
                .evaluate_expr(states, *expr)
                .into_iter()
                .filter(|contract| {
                    matches!(
                        contract.return_value,
                        ValueConstraint::True | ValueConstraint::False
                    )
                })
                .map(|contract| {
                    MethodContract::new(contract.arguments, contract.return_value.negate())
                })
                .collect(),
            Expr::InstanceOf { expr, .. } => match self.param(*expr) {
                // Only the null case is known: a non-null argument may or
                // may not be an instance.
                Some(param) => states
                    .iter()
                    .map(|state| {
                        MethodContract::new(
                            state.with_constraint(param, ValueConstraint::Null),
                            ValueConstraint::False,
                        )
                    })
                    .collect(),
                None => Vec::new(),
            },
            Expr::Literal { .. } => match self.literal_constraint(expr) {
                Some(constraint) => to_contracts(states, constraint),
                None => Vec::new(),
            },
            Expr::Name { .. } => match self.param(expr) {
                Some(param) => self.param_value(states, param),
                None => Vec::new(),
            },
            Expr::Unary { .. }
            | Expr::This { .. }
            | Expr::FieldAccess { .. }
            | Expr::ArrayAccess { .. }
            | Expr::Call { .. }
            | Expr::New { .. }
            | Expr::Assign { .. }
            | Expr::Cast { .. }
            | Expr::Lambda { .. }
            | Expr::MethodRef { .. }
            | Expr::Missing { .. } => Vec::new(),
        }
    }

    fn param(&self, expr: ExprId) -> Option<usize> {
        self.resolver.resolve_param(self.body, expr)
    }

    fn literal_constraint(&self, expr: ExprId) -> Option<ValueConstraint> {
        match &self.body.exprs[expr] {
            Expr::Literal { literal, .. } => match literal {
                LiteralKind::Null => Some(ValueConstraint::Null),
                LiteralKind::True => Some(ValueConstraint::True),
                LiteralKind::False => Some(ValueConstraint::False),
                LiteralKind::Int | LiteralKind::String | LiteralKind::Char => None,
            },
            _ => None,
        }
    }

    fn equality(
        &self,
        states: &[ArgConstraints],
        lhs: ExprId,
        rhs: ExprId,
        equal: bool,
    ) -> Vec<MethodContract> {
        let pinned = match (self.param(lhs), self.literal_constraint(rhs)) {
            (Some(param), Some(constraint)) => Some((param, constraint)),
            _ => self.param(rhs).zip(self.literal_constraint(lhs)),
        };
        let Some((param, constraint)) = pinned else {
            return Vec::new();
        };

        let (when_equal, when_different) = if equal {
            (ValueConstraint::True, ValueConstraint::False)
        } else {
            (ValueConstraint::False, ValueConstraint::True)
        };
        let mut out = Vec::with_capacity(states.len() * 2);
        for state in states {
            out.push(MethodContract::new(
                state.with_constraint(param, constraint),
                when_equal,
            ));
            out.push(MethodContract::new(
                state.with_constraint(param, constraint.negate()),
                when_different,
            ));
        }
        out
    }

    /// `&&` breaks on FALSE, `||` on TRUE. Break results are final; the other
    /// boolean results carry their states to the next operand.
    fn short_circuit(
        &self,
        states: &[ArgConstraints],
        operands: &[ExprId],
        break_value: ValueConstraint,
    ) -> Vec<MethodContract> {
        let mut finished = Vec::new();
        let mut live = states.to_vec();
        for &operand in operands {
            let results = self.evaluate_expr(&live, operand);
            live = returning(&results, break_value.negate());
            finished.extend(
                results
                    .into_iter()
                    .filter(|contract| contract.return_value == break_value),
            );
        }
        finished.extend(to_contracts(&live, break_value.negate()));
        finished
    }

    fn param_value(&self, states: &[ArgConstraints], param: usize) -> Vec<MethodContract> {
        let mut out = Vec::new();
        for state in states {
            match state[param] {
                ValueConstraint::Any => {
                    out.push(MethodContract::new(
                        state.with_constraint(param, ValueConstraint::True),
                        ValueConstraint::True,
                    ));
                    out.push(MethodContract::new(
                        state.with_constraint(param, ValueConstraint::False),
                        ValueConstraint::False,
                    ));
                }
                // Already decided on this path, e.g. `if (o != null) return o;`.
                known => out.push(MethodContract::new(state.clone(), known)),
            }
        }
        out
    }

    /// Contracts of a statement sequence. Only the first statement is looked
    /// at, unless it is an `if` without `else` whose then-branch always
    /// completes abruptly: then the FALSE states flow into the next
    /// statement.
    pub fn evaluate_stmts(
        &self,
        mut states: Vec<ArgConstraints>,
        statements: &[StmtId],
    ) -> Vec<MethodContract> {
        let mut out = Vec::new();
        for &stmt in statements {
            match &self.body.stmts[stmt] {
                Stmt::Block { statements, .. } if statements.len() == 1 => {
                    out.extend(self.evaluate_stmts(states, statements));
                }
                Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                    ..
                } => {
                    let results = self.evaluate_expr(&states, *condition);
                    out.extend(self.evaluate_stmts(
                        returning(&results, ValueConstraint::True),
                        std::slice::from_ref(then_branch),
                    ));

                    let false_states = returning(&results, ValueConstraint::False);
                    match else_branch {
                        Some(else_branch) => out.extend(
                            self.evaluate_stmts(false_states, std::slice::from_ref(else_branch)),
                        ),
                        None if self.always_returns(*then_branch) => {
                            states = false_states;
                            continue;
                        }
                        None => {}
                    }
                }
                Stmt::Throw { .. } => out.extend(to_contracts(&states, ValueConstraint::Throw)),
                Stmt::Return { expr, .. } => {
                    if let Some(expr) = expr {
                        out.extend(self.evaluate_expr(&states, *expr));
                    }
                }
                Stmt::Assert { condition, .. } => {
                    let results = self.evaluate_expr(&states, *condition);
                    out.extend(to_contracts(
                        &returning(&results, ValueConstraint::False),
                        ValueConstraint::Throw,
                    ));
                }
                Stmt::Block { .. }
                | Stmt::While { .. }
                | Stmt::Let { .. }
                | Stmt::Expr { .. }
                | Stmt::Opaque { .. }
                | Stmt::Empty { .. } => {}
            }
            break;
        }
        out
    }

    /// Whether `stmt` always ends in `return` or `throw`. A block qualifies
    /// when any of its statements does.
    pub fn always_returns(&self, stmt: StmtId) -> bool {
        match &self.body.stmts[stmt] {
            Stmt::Return { .. } | Stmt::Throw { .. } => true,
            Stmt::Block { statements, .. } => statements.iter().any(|&s| self.always_returns(s)),
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.always_returns(*then_branch)
                    && else_branch.is_some_and(|else_branch| self.always_returns(else_branch))
            }
            _ => false,
        }
    }
}

/// States of the contracts returning `value`.
fn returning(contracts: &[MethodContract], value: ValueConstraint) -> Vec<ArgConstraints> {
    contracts
        .iter()
        .filter(|contract| contract.return_value == value)
        .map(|contract| contract.arguments.clone())
        .collect()
}

fn to_contracts(states: &[ArgConstraints], value: ValueConstraint) -> Vec<MethodContract> {
    states
        .iter()
        .map(|state| MethodContract::new(state.clone(), value))
        .collect()
}
