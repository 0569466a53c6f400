//! Cell values of an export row.
//!
//! Export tables carry no reliable typing: the same identifier can arrive as
//! `945468368` in one table and `"945468368"` in another depending on whether
//! a schema was available at load time. Joins therefore never compare
//! `Scalar`s directly; they compare the canonical key from [`Scalar::key`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single cell of an export row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Canonical join key for this value.
    ///
    /// Integral floats collapse to their integer form and text is trimmed, so
    /// `Int(12)`, `Float(12.0)` and `Text(" 12 ")` share the key `"12"`.
    /// Null and blank text have no key and never match anything.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => {
                if !f.is_finite() {
                    return None;
                }
                if f.fract() == 0.0 && f.abs() < 9.0e15 {
                    #[allow(clippy::cast_possible_truncation)]
                    let whole = *f as i64;
                    Some(whole.to_string())
                } else {
                    Some(f.to_string())
                }
            }
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    /// Read the value as an integer, accepting integral floats and numeric text.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(_) | Self::Text(_) => self.key()?.parse().ok(),
            Self::Null => None,
        }
    }

    /// Total order used to sort rows independently of source order: null
    /// first, then numbers by value (integers before equal floats), then text.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        const fn rank(value: &Scalar) -> u8 {
            match value {
                Scalar::Null => 0,
                Scalar::Int(_) | Scalar::Float(_) => 1,
                Scalar::Text(_) => 2,
            }
        }
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_)) => {
                #[allow(clippy::cast_precision_loss)]
                let as_f64 = |v: &Self| match v {
                    Self::Int(i) => *i as f64,
                    Self::Float(f) => *f,
                    _ => 0.0,
                };
                as_f64(self)
                    .total_cmp(&as_f64(other))
                    .then_with(|| matches!(self, Self::Float(_)).cmp(&matches!(other, Self::Float(_))))
            }
            _ => rank(self).cmp(&rank(other)),
        }
    }

    /// Borrow the value as text. Numbers are not stringified here; use
    /// [`Scalar::key`] for that.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
