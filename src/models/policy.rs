//! Policy definition and policy assignment data models.

use super::ResourceId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt;

/// Origin of a policy definition.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyType {
    #[default]
    Custom,
    BuiltIn,
    Static,
    NotSpecified,
}

/// Whether an assignment's effect is applied.
///
/// `Default` is the ARM name for enforced.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnforcementMode {
    #[default]
    Default,
    DoNotEnforce,
}

impl fmt::Display for EnforcementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnforcementMode::Default => write!(f, "Enforced"),
            EnforcementMode::DoNotEnforce => write!(f, "DoNotEnforce"),
        }
    }
}

/// Subscription scoped policy definition.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PolicyDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: PolicyDefinitionProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDefinitionProperties {
    #[serde(default)]
    pub policy_type: PolicyType,
    /// `All` or `Indexed`; ARM defaults to `Indexed` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declarative `{"if": .., "then": ..}` rule.
    pub policy_rule: Value,
}

impl PolicyDefinition {
    /// Custom definition from a JSON encoded rule.
    pub fn custom(policy_rule_json: &str) -> Result<PolicyDefinition, Box<dyn Error>> {
        let policy_rule = parse_policy_rule(policy_rule_json)?;
        Ok(PolicyDefinition {
            properties: PolicyDefinitionProperties {
                policy_type: PolicyType::Custom,
                mode: Some("All".to_string()),
                policy_rule,
                ..Default::default()
            },
            ..Default::default()
        })
    }

    /// Effect named in the rule's `then` block, e.g. `deny`.
    pub fn effect(&self) -> Option<&str> {
        self.properties.policy_rule["then"]["effect"].as_str()
    }
}

/// Parse and sanity check a policy rule: an object with `if` and `then.effect`.
pub fn parse_policy_rule(policy_rule_json: &str) -> Result<Value, Box<dyn Error>> {
    let mut de = serde_json::Deserializer::from_str(policy_rule_json);
    let rule: Value = serde_path_to_error::deserialize(&mut de)
        .map_err(|e| format!("Error parsing policy rule: path={} error={}", e.path(), e))?;

    if rule.get("if").map(Value::is_object) != Some(true) {
        return Err("Policy rule needs an 'if' condition object".into());
    }
    if rule["then"]["effect"].as_str().is_none() {
        return Err("Policy rule needs a 'then.effect' string".into());
    }
    Ok(rule)
}

/// Policy assignment binding a definition to a scope.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PolicyAssignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: PolicyAssignmentProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAssignmentProperties {
    pub policy_definition_id: String,
    #[serde(default)]
    pub enforcement_mode: EnforcementMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Scope the assignment applies to (response only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl PolicyAssignment {
    pub fn new(
        policy_definition_id: &ResourceId,
        enforcement_mode: EnforcementMode,
    ) -> PolicyAssignment {
        PolicyAssignment {
            properties: PolicyAssignmentProperties {
                policy_definition_id: policy_definition_id.to_string(),
                enforcement_mode,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RULE: &str = r#"{"if":{"not":{"field":"location","in":["northeurope","westeurope"]}},"then":{"effect":"deny"}}"#;

    #[test]
    fn test_custom_definition_body() {
        let pd = PolicyDefinition::custom(RULE).expect("definition");
        assert_eq!(pd.effect(), Some("deny"));
        let body = serde_json::to_value(&pd).expect("serialize");
        assert_eq!(body["properties"]["policyType"], json!("Custom"));
        assert_eq!(body["properties"]["mode"], json!("All"));
        assert_eq!(
            body["properties"]["policyRule"]["if"]["not"]["in"],
            json!(["northeurope", "westeurope"])
        );
        assert!(body.get("id").is_none(), "id must not be sent");
    }

    #[test]
    fn test_policy_rule_validation() {
        assert!(parse_policy_rule(RULE).is_ok());
        assert!(parse_policy_rule(r#"{"then":{"effect":"deny"}}"#).is_err());
        assert!(parse_policy_rule(r#"{"if":{"field":"type","equals":"x"},"then":{}}"#).is_err());
        let err = parse_policy_rule(r#"{"if": [}"#).unwrap_err();
        assert!(err.to_string().contains("Error parsing policy rule"), "got: {err}");
    }

    #[test]
    fn test_assignment_body_enforcement_modes() {
        let pd_id = ResourceId::subscription_policy_definition("sub", "pdn");
        let enforced = serde_json::to_value(PolicyAssignment::new(&pd_id, EnforcementMode::Default))
            .expect("serialize");
        assert_eq!(enforced["properties"]["enforcementMode"], json!("Default"));
        assert_eq!(
            enforced["properties"]["policyDefinitionId"],
            json!("/subscriptions/sub/providers/Microsoft.Authorization/policyDefinitions/pdn")
        );
        let relaxed =
            serde_json::to_value(PolicyAssignment::new(&pd_id, EnforcementMode::DoNotEnforce))
                .expect("serialize");
        assert_eq!(relaxed["properties"]["enforcementMode"], json!("DoNotEnforce"));
    }

    #[test]
    fn test_parse_definition_response() {
        let json = std::fs::read_to_string("src/tests/test_data/policy_definition.json")
            .expect("Error reading test data");
        let pd: PolicyDefinition = serde_json::from_str(&json).expect("Error parsing definition");
        assert_eq!(pd.name.as_deref(), Some("pdn"));
        assert_eq!(pd.properties.policy_type, PolicyType::Custom);
        assert_eq!(pd.effect(), Some("deny"));
    }

    #[test]
    fn test_enforcement_mode_display() {
        assert_eq!(EnforcementMode::Default.to_string(), "Enforced");
        assert_eq!(EnforcementMode::DoNotEnforce.to_string(), "DoNotEnforce");
    }
}
