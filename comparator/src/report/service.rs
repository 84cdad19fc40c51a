use std::borrow::Cow;
use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Params, Row, params};
use serde_json::{Map, Number, Value};
use tracing::debug;

use super::metadata;
use common::{
    CODE_ANALYSIS, CODE_ANALYSIS_METADATA, PACKAGE_NAME, PackagePair, PackageQuery, VERSION_NAME,
    VersionPair,
};

/// One report row as returned by the API: column name -> value, in the
/// statement's column order, with `CODE_ANALYSIS` expanded last.
pub type ReportRow = Map<String, Value>;

const LIST_APPS_SQL: &str = "
    SELECT APP_NAME, PACKAGE_NAME, VERSION_NAME
    FROM StaticAnalyzer_staticanalyzerandroid";

const PACKAGE_REPORT_SQL: &str = "
    SELECT CODE_ANALYSIS, APP_NAME, DOMAINS, SIZE, SHA256, PACKAGE_NAME, PERMISSIONS,
           VERSION_NAME, MALWARE_PERMISSIONS, TRACKERS, NETWORK_SECURITY, EXPORTED_COUNT
    FROM StaticAnalyzer_staticanalyzerandroid
    WHERE PACKAGE_NAME = ?1";

const COMPARE_APPS_SQL: &str = "
    SELECT APP_NAME, SIZE, SHA256, PACKAGE_NAME, PERMISSIONS, VERSION_NAME,
           MALWARE_PERMISSIONS, TRACKERS, NETWORK_SECURITY, EXPORTED_COUNT, CODE_ANALYSIS
    FROM StaticAnalyzer_staticanalyzerandroid
    WHERE PACKAGE_NAME IN (?1, ?2)";

const COMPARE_VERSIONS_SQL: &str = "
    SELECT APP_NAME, SIZE, SHA256, PACKAGE_NAME, PERMISSIONS, VERSION_NAME,
           MALWARE_PERMISSIONS, DOMAINS, TRACKERS, NETWORK_SECURITY, EXPORTED_COUNT, CODE_ANALYSIS
    FROM StaticAnalyzer_staticanalyzerandroid
    WHERE (PACKAGE_NAME = ?1 AND VERSION_NAME = ?2) OR (PACKAGE_NAME = ?3 AND VERSION_NAME = ?4)";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Read-only access to the analysis report table.
///
/// Holds no connection: every operation opens its own read-only connection,
/// runs a single statement and closes it before returning.
#[derive(Debug, Clone)]
pub struct ReportStore {
    path: PathBuf,
}

impl ReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name and version of every analyzed build.
    pub fn list_apps(&self) -> Result<Vec<ReportRow>, StoreError> {
        self.fetch(LIST_APPS_SQL, [])
    }

    /// Full reports for every stored version of one package.
    pub fn package_report(&self, query: &PackageQuery) -> Result<Vec<ReportRow>, StoreError> {
        self.fetch(PACKAGE_REPORT_SQL, params![query.package.as_str()])
    }

    /// Reports of two packages side by side, without network domains.
    pub fn compare_apps(&self, pair: &PackagePair) -> Result<Vec<ReportRow>, StoreError> {
        self.fetch(
            COMPARE_APPS_SQL,
            params![pair.first.as_str(), pair.second.as_str()],
        )
    }

    /// Reports of two specific builds, the first requested build first.
    pub fn compare_versions(&self, pair: &VersionPair) -> Result<Vec<ReportRow>, StoreError> {
        let mut rows = self.fetch(
            COMPARE_VERSIONS_SQL,
            params![
                pair.first.package.as_str(),
                pair.first.version.as_str(),
                pair.second.package.as_str(),
                pair.second.version.as_str(),
            ],
        )?;

        // Stable: rows of equal rank keep store order.
        rows.sort_by_key(|row| {
            pair.rank(
                row.get(PACKAGE_NAME).and_then(Value::as_str),
                row.get(VERSION_NAME).and_then(Value::as_str),
            )
        });
        Ok(rows)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    fn fetch<P: Params>(&self, sql: &str, params: P) -> Result<Vec<ReportRow>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let rows = stmt
            .query_map(params, |row| shape_row(&columns, row))?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(db = %self.path.display(), rows = rows.len(), "query completed");
        Ok(rows)
    }
}

fn shape_row(columns: &[String], row: &Row<'_>) -> rusqlite::Result<ReportRow> {
    let mut shaped = Map::new();
    let mut code_analysis = None;

    for (idx, name) in columns.iter().enumerate() {
        let value = row.get_ref(idx)?;
        if name == CODE_ANALYSIS {
            code_analysis = Some(metadata::extract(report_text(value).as_deref()));
        } else {
            shaped.insert(name.clone(), to_json(value));
        }
    }

    if let Some(metadata) = code_analysis {
        shaped.insert(CODE_ANALYSIS_METADATA.to_string(), metadata.into_value());
    }
    Ok(shaped)
}

fn report_text(value: ValueRef<'_>) -> Option<Cow<'_, str>> {
    match value {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(String::from_utf8_lossy(bytes)),
        ValueRef::Null | ValueRef::Integer(_) | ValueRef::Real(_) => None,
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(int) => Value::from(int),
        ValueRef::Real(float) => Number::from_f64(float).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
