//! Method contract inference: which argument values lead to which results.
//!
//! [`infer_contracts`] walks a method body with a small abstract interpreter
//! and returns clauses such as `null -> fail` or `!null -> !null`.
//! [`method_contracts`] and [`check_declared_contract`] cover contracts
//! written by hand in `@Contract` annotations.

mod constraint;
mod contract;
mod diagnostics;
mod infer;

pub use crate::constraint::{ArgConstraints, ValueConstraint};
pub use crate::contract::{format_contracts, parse_contracts, ContractParseError, MethodContract};
pub use crate::diagnostics::{
    check_declared_contract, declared_contracts, method_contracts, ContractConfig,
    ContractDiagnosticKind, ContractSource,
};
pub use crate::infer::{
    infer_contracts, infer_contracts_with, InferenceConfig, Interpreter, ParamResolver,
    DEFAULT_MAX_STATES,
};
