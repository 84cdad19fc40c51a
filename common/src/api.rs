//! Raw request bodies. Each one must be a JSON object; fields are read out
//! by name and checked later by the matching validated type.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct PackageNameInput {
    pub package_name: Option<Value>,
}

impl From<Map<String, Value>> for PackageNameInput {
    fn from(mut body: Map<String, Value>) -> Self {
        Self {
            package_name: body.remove("packageName"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct CompareAppsInput {
    pub package_name: Option<Value>,
}

impl From<Map<String, Value>> for CompareAppsInput {
    fn from(mut body: Map<String, Value>) -> Self {
        Self {
            package_name: body.remove("packageName"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct CompareVersionsInput {
    pub package_name1: Option<Value>,
    pub version1: Option<Value>,
    pub package_name2: Option<Value>,
    pub version2: Option<Value>,
}

impl From<Map<String, Value>> for CompareVersionsInput {
    fn from(mut body: Map<String, Value>) -> Self {
        Self {
            package_name1: body.remove("packageName1"),
            version1: body.remove("version1"),
            package_name2: body.remove("packageName2"),
            version2: body.remove("version2"),
        }
    }
}
