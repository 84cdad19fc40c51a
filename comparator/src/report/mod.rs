mod literal;
mod metadata;
mod service;

#[cfg(test)]
pub(crate) mod fixture;

pub use service::{ReportRow, ReportStore, StoreError};
