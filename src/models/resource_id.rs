//! Azure Resource Manager resource identifiers.
//!
//! Provides [`ResourceId`] for building and parsing ids such as
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{ns}/{type}/{name}`,
//! plus name validation for the resources this crate creates.

use regex::Regex;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

/// Provider namespace for policy resources.
pub const POLICY_NAMESPACE: &str = "Microsoft.Authorization";

/// Resource group names: 1-90 chars of word chars, `-`, `_`, `.`, `(`, `)`.
static RESOURCE_GROUP_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_resource_group_regex() -> &'static Regex {
    RESOURCE_GROUP_REGEX
        .get_or_init(|| Regex::new(r"^[-\w\._\(\)]{1,90}$").expect("Invalid Regex"))
}

/// Parsed ARM resource identifier.
///
/// Equality and hashing ignore ASCII case, as ARM does.
#[derive(Debug, Clone)]
pub struct ResourceId {
    /// Subscription id (GUID), if the id is subscription scoped.
    pub subscription_id: Option<String>,
    /// Resource group name, if the id is resource group scoped.
    pub resource_group: Option<String>,
    /// Provider namespace, e.g. `Microsoft.Authorization`.
    pub namespace: Option<String>,
    /// Resource type within the namespace, e.g. `policyAssignments`.
    pub resource_type: Option<String>,
    /// Last segment of the id.
    pub name: String,
    raw: String,
}

impl ResourceId {
    /// `/subscriptions/{subscription_id}`
    pub fn subscription(subscription_id: &str) -> ResourceId {
        ResourceId {
            subscription_id: Some(subscription_id.to_string()),
            resource_group: None,
            namespace: None,
            resource_type: None,
            name: subscription_id.to_string(),
            raw: format!("/subscriptions/{subscription_id}"),
        }
    }

    /// `/subscriptions/{subscription_id}/resourceGroups/{name}`
    pub fn resource_group(subscription_id: &str, name: &str) -> ResourceId {
        ResourceId {
            subscription_id: Some(subscription_id.to_string()),
            resource_group: Some(name.to_string()),
            namespace: None,
            resource_type: None,
            name: name.to_string(),
            raw: format!("/subscriptions/{subscription_id}/resourceGroups/{name}"),
        }
    }

    /// Child resource of `scope` under the given provider namespace and type.
    pub fn provider_resource(
        scope: &ResourceId,
        namespace: &str,
        resource_type: &str,
        name: &str,
    ) -> ResourceId {
        ResourceId {
            subscription_id: scope.subscription_id.clone(),
            resource_group: scope.resource_group.clone(),
            namespace: Some(namespace.to_string()),
            resource_type: Some(resource_type.to_string()),
            name: name.to_string(),
            raw: format!("{scope}/providers/{namespace}/{resource_type}/{name}"),
        }
    }

    /// Subscription scoped custom policy definition.
    pub fn subscription_policy_definition(subscription_id: &str, name: &str) -> ResourceId {
        ResourceId::provider_resource(
            &ResourceId::subscription(subscription_id),
            POLICY_NAMESPACE,
            "policyDefinitions",
            name,
        )
    }

    /// Policy assignment at `scope`.
    pub fn policy_assignment(scope: &ResourceId, name: &str) -> ResourceId {
        ResourceId::provider_resource(scope, POLICY_NAMESPACE, "policyAssignments", name)
    }

    /// Parse an id string as returned by ARM.
    ///
    /// Segment keys (`subscriptions`, `resourceGroups`, `providers`) match
    /// case-insensitively since ARM is not consistent about casing.
    pub fn parse(id: &str) -> Result<ResourceId, Box<dyn Error>> {
        let id = id.trim();
        if !id.starts_with('/') {
            return Err(format!("Resource id must start with '/': {id}").into());
        }
        let parts: Vec<&str> = id.trim_end_matches('/').split('/').skip(1).collect();
        if parts.len() < 2 || parts.len() % 2 != 0 || parts.iter().any(|p| p.is_empty()) {
            return Err(format!("Malformed resource id: {id}").into());
        }

        let mut subscription_id = None;
        let mut resource_group = None;
        let mut namespace = None;
        let mut resource_type = None;

        let mut i = 0;
        while i < parts.len() {
            let key = parts[i];
            if key.eq_ignore_ascii_case("subscriptions") && namespace.is_none() {
                subscription_id = Some(parts[i + 1].to_string());
                i += 2;
            } else if key.eq_ignore_ascii_case("resourceGroups") && namespace.is_none() {
                resource_group = Some(parts[i + 1].to_string());
                i += 2;
            } else if key.eq_ignore_ascii_case("providers") {
                // providers/{ns}/{type}/{name} must leave an even remainder.
                if i + 3 >= parts.len() {
                    return Err(format!("Malformed provider segment in resource id: {id}").into());
                }
                namespace = Some(parts[i + 1].to_string());
                resource_type = Some(parts[i + 2].to_string());
                i += 4;
            } else {
                // nested child type: {type}/{name}
                let parent = resource_type.take().unwrap_or_default();
                resource_type = Some(if parent.is_empty() {
                    key.to_string()
                } else {
                    format!("{parent}/{key}")
                });
                i += 2;
            }
        }

        let name = parts[parts.len() - 1].to_string();
        Ok(ResourceId {
            subscription_id,
            resource_group,
            namespace,
            resource_type,
            name,
            raw: id.trim_end_matches('/').to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        self.raw.eq_ignore_ascii_case(&other.raw)
    }
}

impl Eq for ResourceId {}

impl Hash for ResourceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.raw.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for ResourceId {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceId::parse(s)
    }
}

impl Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<ResourceId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResourceId::parse(&s).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// Check a resource group name against ARM naming rules.
pub fn validate_resource_group_name(name: &str) -> Result<(), Box<dyn Error>> {
    if !get_resource_group_regex().is_match(name) || name.ends_with('.') {
        return Err(format!("Invalid resource group name: '{name}'").into());
    }
    Ok(())
}

/// Check a policy definition / assignment name.
///
/// Max 64 chars, none of `<>*%&:\?.+/#`, no trailing space.
pub fn validate_policy_name(name: &str) -> Result<(), Box<dyn Error>> {
    const FORBIDDEN: &[char] = &['<', '>', '*', '%', '&', ':', '\\', '?', '.', '+', '/', '#'];
    if name.is_empty()
        || name.chars().count() > 64
        || name.contains(FORBIDDEN)
        || name.ends_with(' ')
    {
        return Err(format!("Invalid policy resource name: '{name}'").into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUB: &str = "00000000-1111-2222-3333-444444444444";

    #[test]
    fn test_build_resource_group_id() {
        let id = ResourceId::resource_group(SUB, "rgRSMPA");
        assert_eq!(id.to_string(), format!("/subscriptions/{SUB}/resourceGroups/rgRSMPA"));
        assert_eq!(id.name, "rgRSMPA");
    }

    #[test]
    fn test_build_policy_assignment_id() {
        let rg = ResourceId::resource_group(SUB, "rgRSMPA");
        let id = ResourceId::policy_assignment(&rg, "pan1");
        assert_eq!(
            id.as_str(),
            format!(
                "/subscriptions/{SUB}/resourceGroups/rgRSMPA/providers/Microsoft.Authorization/policyAssignments/pan1"
            )
        );
        assert_eq!(id.resource_group.as_deref(), Some("rgRSMPA"));
    }

    #[test]
    fn test_parse_policy_definition_id() {
        let raw = format!(
            "/subscriptions/{SUB}/providers/Microsoft.Authorization/policyDefinitions/pdn"
        );
        let id = ResourceId::parse(&raw).expect("parse");
        assert_eq!(id.subscription_id.as_deref(), Some(SUB));
        assert_eq!(id.resource_group, None);
        assert_eq!(id.namespace.as_deref(), Some("Microsoft.Authorization"));
        assert_eq!(id.resource_type.as_deref(), Some("policyDefinitions"));
        assert_eq!(id.name, "pdn");
        assert_eq!(id, ResourceId::subscription_policy_definition(SUB, "pdn"));
    }

    #[test]
    fn test_parse_lowercase_segments() {
        let raw = format!("/subscriptions/{SUB}/resourcegroups/rgRSMPA");
        let id = ResourceId::parse(&raw).expect("parse");
        assert_eq!(id.resource_group.as_deref(), Some("rgRSMPA"));
        assert_eq!(id.name, "rgRSMPA");
    }

    #[test]
    fn test_ids_compare_case_insensitively() {
        use std::collections::HashSet;

        let returned = ResourceId::parse(&format!("/subscriptions/{SUB}/resourcegroups/RGRSMPA"))
            .expect("parse");
        let built = ResourceId::resource_group(SUB, "rgRSMPA");
        assert_eq!(returned, built);
        assert_eq!(returned.as_str(), format!("/subscriptions/{SUB}/resourcegroups/RGRSMPA"));

        let set: HashSet<ResourceId> = [returned].into_iter().collect();
        assert!(set.contains(&built));
        assert_ne!(built, ResourceId::resource_group(SUB, "rgOther"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ResourceId::parse("subscriptions/abc").is_err());
        assert!(ResourceId::parse("/subscriptions").is_err());
        assert!(ResourceId::parse("/subscriptions//resourceGroups/x").is_err());
        let provider_only = format!("/subscriptions/{SUB}/providers/Microsoft.Authorization");
        assert!(ResourceId::parse(&provider_only).is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let id = ResourceId::resource_group(SUB, "rg1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"/subscriptions/{SUB}/resourceGroups/rg1\""));
        let back: ResourceId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_validate_resource_group_name() {
        assert!(validate_resource_group_name("rgRSMPA").is_ok());
        assert!(validate_resource_group_name("my-rg_(test).1").is_ok());
        assert!(validate_resource_group_name("").is_err());
        assert!(validate_resource_group_name("ends.with.dot.").is_err());
        assert!(validate_resource_group_name("has space").is_err());
        assert!(validate_resource_group_name(&"x".repeat(91)).is_err());
        assert!(validate_resource_group_name("rg#1").is_err());
    }

    #[test]
    fn test_validate_policy_name() {
        assert!(validate_policy_name("pan1").is_ok());
        assert!(validate_policy_name("deny-outside-eu").is_ok());
        assert!(validate_policy_name("").is_err());
        assert!(validate_policy_name("a/b").is_err());
        assert!(validate_policy_name("a#b").is_err());
        assert!(validate_policy_name("trailing ").is_err());
        assert!(validate_policy_name(&"p".repeat(65)).is_err());
    }
}
