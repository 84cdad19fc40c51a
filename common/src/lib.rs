//! Types shared by the comparator server and its tests: request inputs,
//! validated queries, package identifiers and the error model.

pub mod api;
mod constants;
mod error;
mod package;
mod query;
mod validation;

pub use constants::*;
pub use error::{CompositeError, ErrorCode, ErrorDetail};
pub use package::{AppVersion, InvalidPackageName, PackageName, VersionName};
pub use query::{PackagePair, PackageQuery, VersionPair};
pub use validation::ValidateFrom;
