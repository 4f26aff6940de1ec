//! The closed set of membership operators.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::VocabError;

/// A set relation between a holder's assigned items and a value set.
///
/// | Operator | Holder qualifies when | Accepted names |
/// |----------|-----------------------|----------------|
/// | `RequiresAny` | assigned at least one value | `requires_any`, `in` |
/// | `RequiresAll` | assigned every value | `requires_all`, `all` |
/// | `ExcludesAny` | missing at least one value | `excludes_any`, `-in` |
/// | `ExcludesAll` | assigned none of the values | `excludes_all`, `-all` |
/// | `Only` | assigned exactly the values, nothing else | `only` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Operator {
    /// At least one of the values.
    RequiresAny,
    /// Every one of the values.
    RequiresAll,
    /// Not every one of the values (complement of `RequiresAll`).
    ExcludesAny,
    /// None of the values (complement of `RequiresAny`).
    ExcludesAll,
    /// Exactly the values.
    Only,
}

impl Operator {
    /// All operators, in declaration order.
    pub const ALL: [Operator; 5] = [
        Operator::RequiresAny,
        Operator::RequiresAll,
        Operator::ExcludesAny,
        Operator::ExcludesAll,
        Operator::Only,
    ];

    /// Parses a canonical name or short token.
    pub fn parse(name: &str) -> Result<Self, VocabError> {
        match name {
            "requires_any" | "in" => Ok(Operator::RequiresAny),
            "requires_all" | "all" => Ok(Operator::RequiresAll),
            "excludes_any" | "-in" => Ok(Operator::ExcludesAny),
            "excludes_all" | "-all" => Ok(Operator::ExcludesAll),
            "only" => Ok(Operator::Only),
            other => Err(VocabError::InvalidOperator(other.to_string())),
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Operator::RequiresAny => "requires_any",
            Operator::RequiresAll => "requires_all",
            Operator::ExcludesAny => "excludes_any",
            Operator::ExcludesAll => "excludes_all",
            Operator::Only => "only",
        }
    }

    /// True for the operators defined as a complement over all holders.
    pub fn is_negated(self) -> bool {
        matches!(self, Operator::ExcludesAny | Operator::ExcludesAll)
    }

    /// The operator whose result this one complements, and vice versa.
    /// `Only` has no complement here.
    pub fn complement(self) -> Option<Operator> {
        match self {
            Operator::RequiresAny => Some(Operator::ExcludesAll),
            Operator::RequiresAll => Some(Operator::ExcludesAny),
            Operator::ExcludesAny => Some(Operator::RequiresAll),
            Operator::ExcludesAll => Some(Operator::RequiresAny),
            Operator::Only => None,
        }
    }
}

impl FromStr for Operator {
    type Err = VocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::parse(s)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
