use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct InvalidPackageName(pub String);

impl fmt::Display for InvalidPackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for InvalidPackageName {}

/// Android application id as stored in `PACKAGE_NAME`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageName(String);

impl PackageName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PackageName {
    type Error = InvalidPackageName;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        if name.is_empty() {
            return Err(InvalidPackageName(
                "Package name cannot be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }
}

impl TryFrom<&str> for PackageName {
    type Error = InvalidPackageName;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::try_from(name.to_string())
    }
}

impl FromStr for PackageName {
    type Err = InvalidPackageName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-form `VERSION_NAME` value. Stored builds may carry any string here,
/// including an empty one, so no validation applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionName(String);

impl VersionName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for VersionName {
    fn from(version: String) -> Self {
        Self(version)
    }
}

impl From<&str> for VersionName {
    fn from(version: &str) -> Self {
        Self(version.to_string())
    }
}

impl fmt::Display for VersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One analyzed build: a package at a specific version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppVersion {
    pub package: PackageName,
    pub version: VersionName,
}

impl AppVersion {
    #[must_use]
    pub const fn new(package: PackageName, version: VersionName) -> Self {
        Self { package, version }
    }

    /// True when a report row carries exactly this package and version.
    #[must_use]
    pub fn matches(&self, package: Option<&str>, version: Option<&str>) -> bool {
        package == Some(self.package.as_str()) && version == Some(self.version.as_str())
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (v{})", self.package, self.version)
    }
}
