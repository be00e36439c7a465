//! Method contracts and their `@Contract` text form.
//!
//! A clause reads `c1, c2, ... -> r`; clauses are separated by `;`. A
//! method's contract list is ordered and the first matching clause applies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constraint::{ArgConstraints, ValueConstraint};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodContract {
    pub arguments: ArgConstraints,
    pub return_value: ValueConstraint,
}

impl MethodContract {
    #[must_use]
    pub fn new(arguments: ArgConstraints, return_value: ValueConstraint) -> Self {
        Self {
            arguments,
            return_value,
        }
    }
}

impl fmt::Display for MethodContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, constraint) in self.arguments.as_slice().iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            f.write_str(constraint.as_str())?;
        }
        if !self.arguments.is_empty() {
            f.write_str(" ")?;
        }
        write!(f, "-> {}", self.return_value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractParseError {
    #[error("contract clause `{clause}` has no `->`")]
    MissingArrow { clause: String },
    #[error("unknown constraint `{token}`")]
    UnknownConstraint { token: String },
    #[error("`fail` cannot constrain an argument in `{clause}`")]
    ThrowArgument { clause: String },
    #[error("contract clause `{clause}` has no return value")]
    EmptyReturn { clause: String },
}

impl FromStr for MethodContract {
    type Err = ContractParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let clause = s.trim();
        let Some((args, ret)) = clause.split_once("->") else {
            return Err(ContractParseError::MissingArrow {
                clause: clause.to_string(),
            });
        };

        let ret = ret.trim();
        if ret.is_empty() {
            return Err(ContractParseError::EmptyReturn {
                clause: clause.to_string(),
            });
        }
        let return_value = ret.parse::<ValueConstraint>()?;

        let args = args.trim();
        let mut arguments = Vec::new();
        if !args.is_empty() {
            for token in args.split(',') {
                let constraint = token.parse::<ValueConstraint>()?;
                if constraint == ValueConstraint::Throw {
                    return Err(ContractParseError::ThrowArgument {
                        clause: clause.to_string(),
                    });
                }
                arguments.push(constraint);
            }
        }

        Ok(MethodContract::new(arguments.into(), return_value))
    }
}

/// Parses a `;`-separated list of clauses. Blank text is an empty list.
pub fn parse_contracts(text: &str) -> Result<Vec<MethodContract>, ContractParseError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(';').map(str::parse).collect()
}

/// Renders contracts in `@Contract` form, clauses joined by `"; "`.
#[must_use]
pub fn format_contracts(contracts: &[MethodContract]) -> String {
    contracts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::constraint::ValueConstraint::*;

    #[test]
    fn renders_clauses() {
        let contracts = vec![
            MethodContract::new([Null, Any].into(), Throw),
            MethodContract::new([NotNull, True].into(), NotNull),
        ];
        assert_eq!(
            format_contracts(&contracts),
            "null, _ -> fail; !null, true -> !null"
        );
    }

    #[test]
    fn zero_argument_clause() {
        let contract: MethodContract = "-> fail".parse().unwrap();
        assert!(contract.arguments.is_empty());
        assert_eq!(contract.return_value, Throw);
        assert_eq!(contract.to_string(), "-> fail");
    }

    #[test]
    fn parses_with_loose_whitespace() {
        let contracts = parse_contracts(" null->false ;  !null ,_ ->  true ").unwrap();
        assert_eq!(
            contracts,
            vec![
                MethodContract::new([Null].into(), False),
                MethodContract::new([NotNull, Any].into(), True),
            ]
        );
    }

    #[test]
    fn blank_text_has_no_clauses() {
        assert!(parse_contracts("   ").unwrap().is_empty());
    }

    #[test]
    fn reports_each_error_kind() {
        assert_eq!(
            parse_contracts("null"),
            Err(ContractParseError::MissingArrow {
                clause: "null".to_string()
            })
        );
        assert_eq!(
            parse_contracts("null -> maybe"),
            Err(ContractParseError::UnknownConstraint {
                token: "maybe".to_string()
            })
        );
        assert_eq!(
            parse_contracts("fail -> true"),
            Err(ContractParseError::ThrowArgument {
                clause: "fail -> true".to_string()
            })
        );
        assert_eq!(
            parse_contracts("_ -> "),
            Err(ContractParseError::EmptyReturn {
                clause: "_ ->".to_string()
            })
        );
        assert!(matches!(
            parse_contracts("null -> true;"),
            Err(ContractParseError::MissingArrow { .. })
        ));
    }
}
