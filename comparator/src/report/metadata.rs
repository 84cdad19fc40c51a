use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::literal;
use common::{CODE_ANALYSIS_PARSE_ERROR, ISSUE_TYPE_FIELD};

/// `CODE_ANALYSIS_METADATA` value of one report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CodeAnalysisMetadata {
    /// One entry per issue type, in the order the report declares them.
    Issues(Vec<Map<String, Value>>),
    /// The nested report could not be parsed at all.
    Unparsed { error: String },
}

impl CodeAnalysisMetadata {
    #[must_use]
    pub fn unparsed() -> Self {
        Self::Unparsed {
            error: CODE_ANALYSIS_PARSE_ERROR.to_string(),
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Issues(issues) => Value::Array(issues.into_iter().map(Value::Object).collect()),
            Self::Unparsed { error } => {
                let mut sentinel = Map::new();
                sentinel.insert("error".to_string(), Value::String(error));
                Value::Object(sentinel)
            }
        }
    }
}

/// Flatten a stored `CODE_ANALYSIS` mapping (issue type -> issue data) into
/// per-issue metadata objects tagged with `issue_type`.
///
/// The payload is read as JSON first, then as literal data. A NULL column,
/// an unparseable payload or a top-level value that is not a mapping all
/// yield [`CodeAnalysisMetadata::Unparsed`].
pub fn extract(raw: Option<&str>) -> CodeAnalysisMetadata {
    let Some(raw) = raw else {
        debug!("CODE_ANALYSIS is NULL");
        return CodeAnalysisMetadata::unparsed();
    };

    let report = match serde_json::from_str::<Value>(raw) {
        Ok(report) => report,
        Err(json_error) => match literal::parse(raw) {
            Ok(report) => {
                debug!(error = %json_error, "CODE_ANALYSIS is not JSON, read as literal data");
                report
            }
            Err(literal_error) => {
                warn!(
                    json_error = %json_error,
                    literal_error = %literal_error,
                    "failed to parse CODE_ANALYSIS"
                );
                return CodeAnalysisMetadata::unparsed();
            }
        },
    };

    let Value::Object(issues) = report else {
        warn!("CODE_ANALYSIS is not a mapping");
        return CodeAnalysisMetadata::unparsed();
    };

    CodeAnalysisMetadata::Issues(
        issues
            .into_iter()
            .map(|(issue_type, data)| issue_metadata(issue_type, data))
            .collect(),
    )
}

fn issue_metadata(issue_type: String, mut data: Value) -> Map<String, Value> {
    let metadata = data.get_mut("metadata").map(Value::take);
    let mut metadata = if let Some(Value::Object(metadata)) = metadata {
        metadata
    } else {
        Map::new()
    };
    metadata.insert(ISSUE_TYPE_FIELD.to_string(), Value::String(issue_type));
    metadata
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract_json(raw: &str) -> Value {
        serde_json::to_value(extract(Some(raw))).unwrap()
    }

    #[test]
    fn test_extract_json_report() {
        let value = extract_json(r#"{"a": {"metadata": {"x": 1}}, "b": {"metadata": {}}}"#);
        assert_eq!(
            value,
            json!([{"x": 1, "issue_type": "a"}, {"issue_type": "b"}])
        );
    }

    #[test]
    fn test_extract_unparseable_report() {
        let value = extract_json("not json or literal");
        assert_eq!(value, json!({"error": "Failed to parse CODE_ANALYSIS data"}));
    }

    #[test]
    fn test_extract_literal_report() {
        let raw = concat!(
            "{'android_logging': {'files': {'a.java': '12'}, ",
            "'metadata': {'cvss': 7.5, 'masvs': 'MSTG-STORAGE-3', 'severity': 'info'}}, ",
            "'android_ssl': {'metadata': {'ref': None}}}"
        );
        let value = extract_json(raw);
        assert_eq!(
            value,
            json!([
                {
                    "cvss": 7.5,
                    "masvs": "MSTG-STORAGE-3",
                    "severity": "info",
                    "issue_type": "android_logging"
                },
                {"ref": null, "issue_type": "android_ssl"}
            ])
        );
    }

    #[test]
    fn test_extract_keeps_declaration_order() {
        let metadata = extract(Some(r#"{"z": {}, "a": {}, "m": {}}"#));
        let CodeAnalysisMetadata::Issues(issues) = metadata else {
            panic!("expected issues");
        };
        let order: Vec<&str> = issues
            .iter()
            .map(|issue| issue[ISSUE_TYPE_FIELD].as_str().unwrap())
            .collect();
        assert_eq!(order, ["z", "a", "m"]);
    }

    #[test]
    fn test_extract_empty_report() {
        assert_eq!(extract(Some("{}")), CodeAnalysisMetadata::Issues(Vec::new()));
        assert_eq!(extract_json("{}"), json!([]));
    }

    #[test]
    fn test_extract_missing_or_odd_metadata() {
        let value = extract_json(r#"{"a": {"files": []}, "b": "text", "c": {"metadata": [1, 2]}}"#);
        assert_eq!(
            value,
            json!([{"issue_type": "a"}, {"issue_type": "b"}, {"issue_type": "c"}])
        );
    }

    #[test]
    fn test_extract_issue_type_overrides_existing_field() {
        let value = extract_json(r#"{"real": {"metadata": {"issue_type": "stale", "x": 1}}}"#);
        assert_eq!(value, json!([{"issue_type": "real", "x": 1}]));
    }

    #[test]
    fn test_extract_non_mapping_report() {
        assert_eq!(extract(Some("[1, 2]")), CodeAnalysisMetadata::unparsed());
        assert_eq!(extract(Some("'just text'")), CodeAnalysisMetadata::unparsed());
    }

    #[test]
    fn test_extract_null_report() {
        assert_eq!(extract(None), CodeAnalysisMetadata::unparsed());
    }

    #[test]
    fn test_into_value_matches_serialization() {
        let metadata = extract(Some(r#"{"a": {"metadata": {"x": 1}}}"#));
        assert_eq!(
            metadata.clone().into_value(),
            serde_json::to_value(metadata).unwrap()
        );
        assert_eq!(
            CodeAnalysisMetadata::unparsed().into_value(),
            json!({"error": CODE_ANALYSIS_PARSE_ERROR})
        );
    }
}
