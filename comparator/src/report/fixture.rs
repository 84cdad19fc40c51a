//! On-disk report table for tests.

#![allow(clippy::unwrap_used)]

use rusqlite::{Connection, params};
use tempfile::TempDir;

use super::ReportStore;

const SCHEMA: &str = "
    CREATE TABLE StaticAnalyzer_staticanalyzerandroid (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        APP_NAME TEXT,
        PACKAGE_NAME TEXT,
        VERSION_NAME TEXT,
        SIZE TEXT,
        SHA256 TEXT,
        PERMISSIONS TEXT,
        EXPORTED_COUNT TEXT,
        DOMAINS TEXT,
        TRACKERS TEXT,
        NETWORK_SECURITY TEXT,
        MALWARE_PERMISSIONS TEXT,
        CODE_ANALYSIS TEXT
    )";

pub struct Build {
    app: String,
    package: String,
    version: String,
    code_analysis: Option<String>,
}

impl Build {
    pub fn new(app: &str, package: &str, version: &str) -> Self {
        Self {
            app: app.to_string(),
            package: package.to_string(),
            version: version.to_string(),
            code_analysis: Some("{}".to_string()),
        }
    }

    pub fn code_analysis(mut self, raw: &str) -> Self {
        self.code_analysis = Some(raw.to_string());
        self
    }

    pub fn null_code_analysis(mut self) -> Self {
        self.code_analysis = None;
        self
    }
}

pub struct Fixture {
    _dir: TempDir,
    pub store: ReportStore,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports.sqlite3");
        Connection::open(&path).unwrap().execute_batch(SCHEMA).unwrap();
        Self {
            store: ReportStore::new(path),
            _dir: dir,
        }
    }

    pub fn insert(&self, build: &Build) {
        let conn = Connection::open(self.store.path()).unwrap();
        conn.execute(
            "INSERT INTO StaticAnalyzer_staticanalyzerandroid (
                APP_NAME, PACKAGE_NAME, VERSION_NAME, SIZE, SHA256, PERMISSIONS,
                EXPORTED_COUNT, DOMAINS, TRACKERS, NETWORK_SECURITY,
                MALWARE_PERMISSIONS, CODE_ANALYSIS
            ) VALUES (?1, ?2, ?3, '4.2MB', ?4, '{}', 3, '{}', '{}', '{}', '[]', ?5)",
            params![
                build.app,
                build.package,
                build.version,
                format!("sha256-{}-{}", build.package, build.version),
                build.code_analysis,
            ],
        )
        .unwrap();
    }
}
