//! Conditions: possibly-wildcarded points of the condition lattice.
//!
//! A [`Condition`] denotes the set of supported configurations it matches.
//! Wildcards ([`AttrValue::Any`], written `*`) match every value of their
//! attribute that the support matrix allows in combination with the other
//! attributes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lattice::{Attribute, Configuration};

/// Textual form of the wildcard.
pub const WILDCARD: &str = "*";

// ---------------------------------------------------------------------------
// AttrValue
// ---------------------------------------------------------------------------

/// The value of one attribute in a [`Condition`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttrValue {
    /// Matches every value of the attribute.
    Any,
    /// Matches exactly one value.
    Exact(String),
}

impl AttrValue {
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Returns `true` if this value matches the concrete `value`.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(exact) => exact == value,
        }
    }

    /// Returns `true` if every value matched by `other` is matched by `self`.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Any, _) => true,
            (Self::Exact(_), Self::Any) => false,
            (Self::Exact(a), Self::Exact(b)) => a == b,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        if value == WILDCARD {
            Self::Any
        } else {
            Self::Exact(value.to_owned())
        }
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        if value == WILDCARD {
            Self::Any
        } else {
            Self::Exact(value)
        }
    }
}

impl From<AttrValue> for String {
    fn from(value: AttrValue) -> Self {
        match value {
            AttrValue::Any => WILDCARD.to_owned(),
            AttrValue::Exact(value) => value,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(WILDCARD),
            Self::Exact(value) => f.write_str(value),
        }
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// An `(architecture, branding, platform)` tuple, each possibly wildcarded.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Condition {
    pub architecture: AttrValue,
    pub branding: AttrValue,
    pub platform: AttrValue,
}

impl Condition {
    /// Create a condition; `"*"` is parsed as a wildcard.
    pub fn new(
        architecture: impl Into<AttrValue>,
        branding: impl Into<AttrValue>,
        platform: impl Into<AttrValue>,
    ) -> Self {
        Self {
            architecture: architecture.into(),
            branding: branding.into(),
            platform: platform.into(),
        }
    }

    /// The condition matching every configuration.
    #[must_use]
    pub const fn universal() -> Self {
        Self {
            architecture: AttrValue::Any,
            branding: AttrValue::Any,
            platform: AttrValue::Any,
        }
    }

    #[must_use]
    pub const fn get(&self, attribute: Attribute) -> &AttrValue {
        match attribute {
            Attribute::Architecture => &self.architecture,
            Attribute::Branding => &self.branding,
            Attribute::Platform => &self.platform,
        }
    }

    /// A copy of this condition with `attribute` set to `value`.
    #[must_use]
    pub fn with(&self, attribute: Attribute, value: AttrValue) -> Self {
        let mut out = self.clone();
        match attribute {
            Attribute::Architecture => out.architecture = value,
            Attribute::Branding => out.branding = value,
            Attribute::Platform => out.platform = value,
        }
        out
    }

    /// A copy of this condition with `attribute` wildcarded.
    #[must_use]
    pub fn widen(&self, attribute: Attribute) -> Self {
        self.with(attribute, AttrValue::Any)
    }

    #[must_use]
    pub const fn is_universal(&self) -> bool {
        self.architecture.is_any() && self.branding.is_any() && self.platform.is_any()
    }

    /// Returns `true` if `configuration` is one of the configurations this
    /// condition denotes.
    #[must_use]
    pub fn matches(&self, configuration: &Configuration) -> bool {
        Attribute::ALL
            .iter()
            .all(|&attr| self.get(attr).matches(configuration.get(attr)))
    }

    /// Returns `true` if `self` structurally covers `other`, i.e. every
    /// configuration matched by `other` is matched by `self` regardless of
    /// the support matrix.
    #[must_use]
    pub fn subsumes(&self, other: &Self) -> bool {
        Attribute::ALL
            .iter()
            .all(|&attr| self.get(attr).covers(other.get(attr)))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.architecture, self.branding, self.platform)
    }
}

/// Error parsing a [`Condition`] from its `arch/branding/platform` form.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid condition `{input}`: expected `<architecture>/<branding>/<platform>`")]
pub struct ParseConditionError {
    input: String,
}

impl FromStr for Condition {
    type Err = ParseConditionError;

    /// Parse `ia32/Chromium/win`; any component may be `*`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').map(str::trim).collect();
        match parts.as_slice() {
            [arch, branding, platform]
                if !arch.is_empty() && !branding.is_empty() && !platform.is_empty() =>
            {
                Ok(Self::new(*arch, *branding, *platform))
            }
            _ => Err(ParseConditionError {
                input: s.to_owned(),
            }),
        }
    }
}
