use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::content::contains_search_term;

/// Test plan as returned by `_apis/testplan/plans`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPlan {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub area_path: Option<String>,
    #[serde(default)]
    pub iteration: Option<String>,
    /// Remaining fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TestPlan {
    /// Whether the name or description mentions `text`
    pub fn matches(&self, text: &str) -> bool {
        contains_search_term(&self.name, text)
            || self
                .description
                .as_deref()
                .is_some_and(|description| contains_search_term(description, text))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReference {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub suite_type: Option<String>,
    #[serde(default)]
    pub parent_suite: Option<SuiteReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A plan together with its suites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPlanDetails {
    #[serde(flatten)]
    pub plan: TestPlan,
    pub suites: Vec<TestSuite>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseWorkItem {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Test case entry of a suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub work_item: Option<TestCaseWorkItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
