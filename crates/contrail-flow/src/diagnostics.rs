use contrail_hir::{Annotation, Method};
use contrail_types::{Diagnostic, Span};

use crate::contract::{parse_contracts, ContractParseError, MethodContract};
use crate::infer::{infer_contracts_with, InferenceConfig};

const CONTRACT_ANNOTATION: &str = "Contract";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractDiagnosticKind {
    Syntax,
    Arity,
}

pub(crate) fn diagnostic(
    kind: ContractDiagnosticKind,
    span: Option<Span>,
    message: String,
) -> Diagnostic {
    match kind {
        ContractDiagnosticKind::Syntax => Diagnostic::error("CONTRACT_SYNTAX", message, span),
        ContractDiagnosticKind::Arity => Diagnostic::error("CONTRACT_ARITY", message, span),
    }
}

/// Which contracts [`method_contracts`] returns, and how inference runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractConfig {
    pub inference: InferenceConfig,
    /// Use a valid `@Contract` annotation instead of inferring.
    pub prefer_declared: bool,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            prefer_declared: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractSource {
    Declared,
    Inferred,
}

fn contract_annotation(method: &Method) -> Option<&Annotation> {
    method
        .annotations
        .iter()
        .find(|annotation| annotation.simple_name() == CONTRACT_ANNOTATION)
}

/// Contracts written in the method's `@Contract` annotation, if it has one
/// with a string value.
pub fn declared_contracts(
    method: &Method,
) -> Option<Result<Vec<MethodContract>, ContractParseError>> {
    let text = contract_annotation(method)?.value.as_deref()?;
    Some(parse_contracts(text))
}

/// Declared contracts when configured and usable, inferred ones otherwise.
///
/// Declared contracts with a syntax error or the wrong number of arguments
/// are ignored.
pub fn method_contracts(
    method: &Method,
    config: &ContractConfig,
) -> (ContractSource, Vec<MethodContract>) {
    if config.prefer_declared {
        match declared_contracts(method) {
            Some(Ok(contracts))
                if contracts
                    .iter()
                    .all(|contract| contract.arguments.len() == method.params.len()) =>
            {
                return (ContractSource::Declared, contracts);
            }
            Some(Ok(_)) => {
                tracing::debug!(method = %method.name, "declared contract arity mismatch, inferring");
            }
            Some(Err(err)) => {
                tracing::debug!(method = %method.name, error = %err, "declared contract unparsable, inferring");
            }
            None => {}
        }
    }
    (
        ContractSource::Inferred,
        infer_contracts_with(method, &config.inference),
    )
}

/// Problems with the method's `@Contract` annotation. An annotation without
/// a `value` (`@Contract(pure = true)`) has nothing to check.
pub fn check_declared_contract(method: &Method) -> Vec<Diagnostic> {
    let Some(annotation) = contract_annotation(method) else {
        return Vec::new();
    };
    let Some(text) = annotation.value.as_deref() else {
        return Vec::new();
    };
    let span = Some(annotation.range).filter(|range| !range.is_empty());

    let contracts = match parse_contracts(text) {
        Ok(contracts) => contracts,
        Err(err) => {
            return vec![diagnostic(
                ContractDiagnosticKind::Syntax,
                span,
                format!("invalid contract on `{}`: {err}", method.name),
            )]
        }
    };

    let expected = method.params.len();
    contracts
        .iter()
        .filter(|contract| contract.arguments.len() != expected)
        .map(|contract| {
            diagnostic(
                ContractDiagnosticKind::Arity,
                span,
                format!(
                    "contract clause `{contract}` has {} argument(s) but `{}` takes {expected}",
                    contract.arguments.len(),
                    method.name
                ),
            )
        })
        .collect()
}
