use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::contract::ContractParseError;

/// Abstract value of an argument or a method result.
///
/// Serialized in its `@Contract` text form (`_`, `null`, `!null`, `true`,
/// `false`, `fail`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueConstraint {
    #[serde(rename = "_")]
    Any,
    #[serde(rename = "null")]
    Null,
    #[serde(rename = "!null")]
    NotNull,
    #[serde(rename = "true")]
    True,
    #[serde(rename = "false")]
    False,
    /// The method throws. Only meaningful as a result.
    #[serde(rename = "fail")]
    Throw,
}

impl ValueConstraint {
    pub const ALL: [ValueConstraint; 6] = [
        ValueConstraint::Any,
        ValueConstraint::Null,
        ValueConstraint::NotNull,
        ValueConstraint::True,
        ValueConstraint::False,
        ValueConstraint::Throw,
    ];

    /// `Null`/`NotNull` and `True`/`False` swap; `Any` and `Throw` are fixed
    /// points.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            ValueConstraint::Null => ValueConstraint::NotNull,
            ValueConstraint::NotNull => ValueConstraint::Null,
            ValueConstraint::True => ValueConstraint::False,
            ValueConstraint::False => ValueConstraint::True,
            ValueConstraint::Any | ValueConstraint::Throw => self,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValueConstraint::Any => "_",
            ValueConstraint::Null => "null",
            ValueConstraint::NotNull => "!null",
            ValueConstraint::True => "true",
            ValueConstraint::False => "false",
            ValueConstraint::Throw => "fail",
        }
    }
}

impl fmt::Display for ValueConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueConstraint {
    type Err = ContractParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        ValueConstraint::ALL
            .into_iter()
            .find(|c| c.as_str() == token)
            .ok_or_else(|| ContractParseError::UnknownConstraint {
                token: token.to_string(),
            })
    }
}

/// One constraint per parameter, in declaration order.
///
/// Immutable and cheap to clone: [`ArgConstraints::with_constraint`] returns
/// a new vector and leaves `self` untouched, so states can be shared freely
/// between branches.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ArgConstraints(Arc<[ValueConstraint]>);

impl ArgConstraints {
    /// The unconstrained state for a method with `len` parameters.
    #[must_use]
    pub fn any(len: usize) -> Self {
        ArgConstraints(vec![ValueConstraint::Any; len].into())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<ValueConstraint> {
        self.0.get(idx).copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ValueConstraint] {
        &self.0
    }

    /// Copy of `self` with slot `idx` replaced by `constraint`.
    ///
    /// # Panics
    ///
    /// If `idx` is not a parameter index.
    #[must_use]
    pub fn with_constraint(&self, idx: usize, constraint: ValueConstraint) -> Self {
        let mut slots = self.0.to_vec();
        slots[idx] = constraint;
        ArgConstraints(slots.into())
    }
}

impl From<Vec<ValueConstraint>> for ArgConstraints {
    fn from(slots: Vec<ValueConstraint>) -> Self {
        ArgConstraints(slots.into())
    }
}

impl<const N: usize> From<[ValueConstraint; N]> for ArgConstraints {
    fn from(slots: [ValueConstraint; N]) -> Self {
        ArgConstraints(slots.as_slice().into())
    }
}

impl std::ops::Index<usize> for ArgConstraints {
    type Output = ValueConstraint;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.0[idx]
    }
}

impl fmt::Debug for ArgConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl Serialize for ArgConstraints {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for ArgConstraints {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<ValueConstraint>::deserialize(deserializer).map(ArgConstraints::from)
    }
}
