//! Validated request types for the report endpoints.

use serde_json::Value;

use crate::api::{CompareAppsInput, CompareVersionsInput, PackageNameInput};
use crate::{AppVersion, CompositeError, ErrorCode, PackageName, ValidateFrom, VersionName};

fn require_string(
    field: &str,
    value: Option<Value>,
    errors: &mut CompositeError,
) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            errors.add_detail(
                field,
                ErrorCode::Ebadrequest,
                &format!("{field} must be a string"),
            );
            None
        }
        None => {
            errors.add_detail(
                field,
                ErrorCode::Ebadrequest,
                &format!("{field} is required"),
            );
            None
        }
    }
}

fn require_package(
    field: &str,
    value: Option<Value>,
    errors: &mut CompositeError,
) -> Option<PackageName> {
    let raw = require_string(field, value, errors)?;
    match PackageName::try_from(raw) {
        Ok(name) => Some(name),
        Err(e) => {
            errors.add_detail(field, ErrorCode::Ebadrequest, &e.to_string());
            None
        }
    }
}

/// Body of `POST /accept-package-name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageQuery {
    pub package: PackageName,
}

impl TryFrom<PackageNameInput> for PackageQuery {
    type Error = CompositeError;

    fn try_from(input: PackageNameInput) -> Result<Self, Self::Error> {
        let mut errors = CompositeError::new(ErrorCode::Ebadrequest, Self::REJECTION);

        match require_package("packageName", input.package_name, &mut errors) {
            Some(package) if !errors.has_errors() => Ok(Self { package }),
            _ => Err(errors),
        }
    }
}

impl ValidateFrom for PackageQuery {
    type Input = PackageNameInput;

    const REJECTION: &'static str = "Invalid JSON";

    fn validate_from(input: PackageNameInput) -> Result<Self, CompositeError> {
        Self::try_from(input)
    }
}

/// Body of `POST /compare-apps`: exactly two package names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePair {
    pub first: PackageName,
    pub second: PackageName,
}

impl TryFrom<CompareAppsInput> for PackagePair {
    type Error = CompositeError;

    fn try_from(input: CompareAppsInput) -> Result<Self, Self::Error> {
        let mut errors = CompositeError::new(ErrorCode::Ebadrequest, Self::REJECTION);

        let items = match input.package_name {
            Some(Value::Array(items)) => items,
            Some(_) => {
                errors.add_detail(
                    "packageName",
                    ErrorCode::Ebadrequest,
                    "packageName must be a list",
                );
                return Err(errors);
            }
            None => {
                errors.add_detail(
                    "packageName",
                    ErrorCode::Ebadrequest,
                    "packageName is required",
                );
                return Err(errors);
            }
        };

        let [first, second]: [Value; 2] = match items.try_into() {
            Ok(pair) => pair,
            Err(items) => {
                errors.add_detail(
                    "packageName",
                    ErrorCode::Ebadrequest,
                    &format!("expected 2 package names, got {}", items.len()),
                );
                return Err(errors);
            }
        };

        let first = require_package("packageName[0]", Some(first), &mut errors);
        let second = require_package("packageName[1]", Some(second), &mut errors);

        match (first, second) {
            (Some(first), Some(second)) if !errors.has_errors() => Ok(Self { first, second }),
            _ => Err(errors),
        }
    }
}

impl ValidateFrom for PackagePair {
    type Input = CompareAppsInput;

    const REJECTION: &'static str = "Invalid request. Please provide exactly two package names.";

    fn validate_from(input: CompareAppsInput) -> Result<Self, CompositeError> {
        Self::try_from(input)
    }
}

/// Body of `POST /compare-apps-versions`: two builds, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPair {
    pub first: AppVersion,
    pub second: AppVersion,
}

impl VersionPair {
    /// Sort rank of a report row: builds matching `first` come before builds
    /// matching `second`, anything else last.
    #[must_use]
    pub fn rank(&self, package: Option<&str>, version: Option<&str>) -> u8 {
        if self.first.matches(package, version) {
            0
        } else if self.second.matches(package, version) {
            1
        } else {
            2
        }
    }
}

impl TryFrom<CompareVersionsInput> for VersionPair {
    type Error = CompositeError;

    fn try_from(input: CompareVersionsInput) -> Result<Self, Self::Error> {
        let mut errors = CompositeError::new(ErrorCode::Ebadrequest, Self::REJECTION);

        let package1 = require_package("packageName1", input.package_name1, &mut errors);
        let version1 = require_string("version1", input.version1, &mut errors);
        let package2 = require_package("packageName2", input.package_name2, &mut errors);
        let version2 = require_string("version2", input.version2, &mut errors);

        if errors.has_errors() {
            return Err(errors);
        }

        let (Some(package1), Some(version1), Some(package2), Some(version2)) =
            (package1, version1, package2, version2)
        else {
            return Err(errors);
        };

        Ok(Self {
            first: AppVersion::new(package1, VersionName::from(version1)),
            second: AppVersion::new(package2, VersionName::from(version2)),
        })
    }
}

impl ValidateFrom for VersionPair {
    type Input = CompareVersionsInput;

    const REJECTION: &'static str =
        "Invalid request. Please provide two package names and their versions.";

    fn validate_from(input: CompareVersionsInput) -> Result<Self, CompositeError> {
        Self::try_from(input)
    }
}
