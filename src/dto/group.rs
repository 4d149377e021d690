use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub group_name: String,
    pub users: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FindGroupsResponse {
    #[serde(rename = "mailId", default)]
    pub mail_id: Option<String>,
    pub groups: Option<Vec<Value>>,
}

/// Group names as listed by `/find_groups`, which sends either bare names or
/// group objects.
pub fn group_names(groups: &[Value]) -> Vec<String> {
    groups
        .iter()
        .filter_map(|g| match g {
            Value::String(name) => Some(name.clone()),
            Value::Object(obj) => obj
                .get("group_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect()
}
