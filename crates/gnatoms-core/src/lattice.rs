//! The condition lattice: attribute domains and supported configurations.
//!
//! A [`SupportMatrix`] declares the finite domain of every [`Attribute`] and
//! which combinations of values are actually buildable. Platforms restrict the
//! architectures and brandings they support (e.g. there is no `arm` build for
//! Windows, and the `ChromeOS` branding only exists on Linux). Wildcards are
//! always interpreted against this matrix: `(*, Chromium, win)` means "every
//! architecture Windows supports", not "every architecture anywhere".
//!
//! The matrix is immutable once built. All supported [`Configuration`]s are
//! enumerated eagerly, in sorted order, so that everything derived from them
//! is deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::{AttrValue, Condition};
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Attribute
// ---------------------------------------------------------------------------

/// One axis of the condition lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    /// Target CPU architecture (`ia32`, `x64`, `arm`, ...).
    Architecture,
    /// Product branding (`Chromium`, `Chrome`, ...).
    Branding,
    /// Host platform (`linux`, `win`, ...).
    Platform,
}

impl Attribute {
    /// Every attribute, in the order the reducer scans them.
    pub const ALL: [Self; 3] = [Self::Architecture, Self::Branding, Self::Platform];

    /// Lowercase name of the attribute.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Architecture => "architecture",
            Self::Branding => "branding",
            Self::Platform => "platform",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// A concrete, buildable combination of attribute values.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Configuration {
    pub architecture: String,
    pub branding: String,
    pub platform: String,
}

impl Configuration {
    pub fn new(
        architecture: impl Into<String>,
        branding: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            architecture: architecture.into(),
            branding: branding.into(),
            platform: platform.into(),
        }
    }

    /// Value of `attribute` in this configuration.
    #[must_use]
    pub fn get(&self, attribute: Attribute) -> &str {
        match attribute {
            Attribute::Architecture => &self.architecture,
            Attribute::Branding => &self.branding,
            Attribute::Platform => &self.platform,
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.architecture, self.branding, self.platform)
    }
}

// ---------------------------------------------------------------------------
// PlatformSupport
// ---------------------------------------------------------------------------

/// Architectures and brandings buildable on one platform.
///
/// `None` means the whole global domain of that attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlatformSupport {
    pub architectures: Option<BTreeSet<String>>,
    pub brandings: Option<BTreeSet<String>>,
}

impl PlatformSupport {
    /// Support every architecture and branding of the global domain.
    #[must_use]
    pub const fn everything() -> Self {
        Self {
            architectures: None,
            brandings: None,
        }
    }

    /// Restrict the platform to the given architectures and brandings.
    pub fn restricted<A, B>(architectures: A, brandings: B) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self {
            architectures: Some(architectures.into_iter().map(Into::into).collect()),
            brandings: Some(brandings.into_iter().map(Into::into).collect()),
        }
    }
}

// ---------------------------------------------------------------------------
// SupportMatrix
// ---------------------------------------------------------------------------

/// Finite attribute domains plus the set of supported configurations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupportMatrix {
    architectures: BTreeSet<String>,
    brandings: BTreeSet<String>,
    platforms: BTreeMap<String, PlatformSupport>,
    /// Every supported configuration, sorted.
    configurations: Vec<Configuration>,
}

impl SupportMatrix {
    /// Build a matrix from global domains and per-platform restrictions.
    ///
    /// # Errors
    ///
    /// * [`EngineError::UnknownAttributeValue`] if a platform restriction names
    ///   an architecture or branding outside the global domain.
    pub fn new<A, B, P>(architectures: A, brandings: B, platforms: P) -> Result<Self, EngineError>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
        P: IntoIterator<Item = (String, PlatformSupport)>,
    {
        let architectures: BTreeSet<String> = architectures.into_iter().map(Into::into).collect();
        let brandings: BTreeSet<String> = brandings.into_iter().map(Into::into).collect();
        let platforms: BTreeMap<String, PlatformSupport> = platforms.into_iter().collect();

        for support in platforms.values() {
            for arch in support.architectures.iter().flatten() {
                check_domain(Attribute::Architecture, &architectures, arch)?;
            }
            for branding in support.brandings.iter().flatten() {
                check_domain(Attribute::Branding, &brandings, branding)?;
            }
        }

        let mut configurations = Vec::new();
        for (platform, support) in &platforms {
            let archs = support.architectures.as_ref().unwrap_or(&architectures);
            let brands = support.brandings.as_ref().unwrap_or(&brandings);
            for arch in archs {
                for branding in brands {
                    configurations.push(Configuration::new(arch, branding, platform));
                }
            }
        }
        configurations.sort();

        Ok(Self {
            architectures,
            brandings,
            platforms,
            configurations,
        })
    }

    /// The matrix Chromium builds FFmpeg for.
    #[must_use]
    pub fn chromium() -> Self {
        let platforms = [
            (
                "android",
                PlatformSupport::restricted(["ia32", "x64", "arm-neon", "arm64"], ["Chromium", "Chrome"]),
            ),
            (
                "linux",
                PlatformSupport::restricted(
                    ["ia32", "x64", "arm", "arm-neon", "arm64"],
                    ["Chromium", "Chrome", "ChromeOS"],
                ),
            ),
            (
                "mac",
                PlatformSupport::restricted(["x64", "arm64"], ["Chromium", "Chrome"]),
            ),
            (
                "win",
                PlatformSupport::restricted(["ia32", "x64", "arm64"], ["Chromium", "Chrome"]),
            ),
        ];

        Self::new(
            ["ia32", "x64", "arm", "arm-neon", "arm64"],
            ["Chromium", "Chrome", "ChromeOS"],
            platforms
                .into_iter()
                .map(|(name, support)| (name.to_owned(), support)),
        )
        .unwrap_or_else(|e| unreachable!("built-in matrix is consistent: {e}"))
    }

    /// Declared domain of `attribute`, sorted.
    pub fn domain(&self, attribute: Attribute) -> Box<dyn Iterator<Item = &str> + '_> {
        match attribute {
            Attribute::Architecture => Box::new(self.architectures.iter().map(String::as_str)),
            Attribute::Branding => Box::new(self.brandings.iter().map(String::as_str)),
            Attribute::Platform => Box::new(self.platforms.keys().map(String::as_str)),
        }
    }

    /// Returns `true` if `value` is part of the declared domain of `attribute`.
    #[must_use]
    pub fn contains(&self, attribute: Attribute, value: &str) -> bool {
        match attribute {
            Attribute::Architecture => self.architectures.contains(value),
            Attribute::Branding => self.brandings.contains(value),
            Attribute::Platform => self.platforms.contains_key(value),
        }
    }

    /// Restrictions declared for `platform`, if it exists.
    #[must_use]
    pub fn platform(&self, platform: &str) -> Option<&PlatformSupport> {
        self.platforms.get(platform)
    }

    /// Check that every non-wildcard value of `condition` is in its domain.
    ///
    /// # Errors
    ///
    /// * [`EngineError::UnknownAttributeValue`] naming the first offending
    ///   attribute and value.
    pub fn validate(&self, condition: &Condition) -> Result<(), EngineError> {
        for attribute in Attribute::ALL {
            if let AttrValue::Exact(value) = condition.get(attribute)
                && !self.contains(attribute, value)
            {
                return Err(EngineError::UnknownAttributeValue {
                    attribute,
                    value: value.clone(),
                    expected: self.domain(attribute).collect::<Vec<_>>().join(", "),
                });
            }
        }
        Ok(())
    }

    /// Every supported configuration, sorted.
    #[must_use]
    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    /// Supported configurations matched by `condition`.
    pub fn configurations_matching<'a>(
        &'a self,
        condition: &'a Condition,
    ) -> impl Iterator<Item = &'a Configuration> + 'a {
        self.configurations
            .iter()
            .filter(move |config| condition.matches(config))
    }

    /// Returns `true` if `configuration` is buildable under this matrix.
    #[must_use]
    pub fn is_supported(&self, configuration: &Configuration) -> bool {
        self.configurations.binary_search(configuration).is_ok()
    }
}

impl Default for SupportMatrix {
    fn default() -> Self {
        Self::chromium()
    }
}

impl fmt::Display for SupportMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(", ");
        for (platform, support) in &self.platforms {
            let archs = support.architectures.as_ref().unwrap_or(&self.architectures);
            let brands = support.brandings.as_ref().unwrap_or(&self.brandings);
            writeln!(f, "{platform}")?;
            writeln!(f, "  architectures: {}", join(archs))?;
            writeln!(f, "  brandings:     {}", join(brands))?;
        }
        Ok(())
    }
}

fn check_domain(
    attribute: Attribute,
    domain: &BTreeSet<String>,
    value: &str,
) -> Result<(), EngineError> {
    if domain.contains(value) {
        return Ok(());
    }
    Err(EngineError::UnknownAttributeValue {
        attribute,
        value: value.to_owned(),
        expected: domain.iter().cloned().collect::<Vec<_>>().join(", "),
    })
}
