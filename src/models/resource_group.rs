//! Azure resource group data model.

use super::ResourceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resource group as sent to and returned by ARM.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ResourceGroup {
    /// Full resource id (response only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    /// Resource group name (response only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Azure region, e.g. `westus`.
    pub location: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ResourceGroupProperties>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

impl ResourceGroup {
    /// Request body for a new resource group in `location`.
    pub fn new(location: &str) -> ResourceGroup {
        ResourceGroup {
            location: location.to_string(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> ResourceGroup {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn provisioning_state(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.provisioning_state.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_is_minimal() {
        let body = serde_json::to_value(ResourceGroup::new("westus")).expect("serialize");
        assert_eq!(body, serde_json::json!({ "location": "westus" }));
    }

    #[test]
    fn test_parse_response() {
        let json = std::fs::read_to_string("src/tests/test_data/resource_group.json")
            .expect("Error reading test data");
        let rg: ResourceGroup = serde_json::from_str(&json).expect("Error parsing resource group");
        assert_eq!(rg.name.as_deref(), Some("rgRSMPA"));
        assert_eq!(rg.location, "westus");
        assert_eq!(rg.provisioning_state(), Some("Succeeded"));
        assert_eq!(
            rg.id.expect("id").resource_group.as_deref(),
            Some("rgRSMPA")
        );
        assert_eq!(rg.tags.get("createdBy").map(String::as_str), Some("azure-policy-assignment"));
    }
}
