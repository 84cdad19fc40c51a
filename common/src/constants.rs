pub const APP_NAME: &str = "APP_NAME";
pub const PACKAGE_NAME: &str = "PACKAGE_NAME";
pub const VERSION_NAME: &str = "VERSION_NAME";
pub const CODE_ANALYSIS: &str = "CODE_ANALYSIS";
pub const CODE_ANALYSIS_METADATA: &str = "CODE_ANALYSIS_METADATA";

pub const ISSUE_TYPE_FIELD: &str = "issue_type";
pub const CODE_ANALYSIS_PARSE_ERROR: &str = "Failed to parse CODE_ANALYSIS data";

pub const WELCOME_MESSAGE: &str = "Welcome to the Android Analysis Tool API";
