use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Work item as returned by `_apis/wit/workitems`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: i64,
    #[serde(default)]
    pub rev: Option<i64>,
    /// Field reference name (`System.Title`, ...) to value
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub relations: Vec<WorkItemRelation>,
    #[serde(default)]
    pub url: Option<String>,
    /// Everything else the API sends (`_links`, `commentVersionRef`, ...), kept as is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkItem {
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.field_str("System.Title")
    }

    pub fn state(&self) -> Option<&str> {
        self.field_str("System.State")
    }

    pub fn work_item_type(&self) -> Option<&str> {
        self.field_str("System.WorkItemType")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemRelation {
    pub rel: String,
    pub url: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemReference {
    pub id: i64,
}

/// Response of `_apis/wit/wiql`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiqlResult {
    #[serde(default)]
    pub work_items: Vec<WorkItemReference>,
}

impl WiqlResult {
    pub fn ids(&self) -> Vec<i64> {
        self.work_items.iter().map(|item| item.id).collect()
    }
}
