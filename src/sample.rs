//! Policy assignment sample: provision, list and tear down.
//!
//! Creates a resource group, a custom policy definition and two assignments
//! (one enforced, one not), lists the assignments, then deletes everything
//! again. The resource group delete is attempted on every exit path.

use crate::azure::ResourceApi;
use crate::config::Settings;
use crate::models::{
    validate_policy_name, validate_resource_group_name, EnforcementMode, PolicyAssignment,
    PolicyDefinition, ResourceGroup, ResourceId,
};
use crate::output;
use chrono::SecondsFormat;
use colored::Colorize;
use std::error::Error;

/// Deny anything outside North and West Europe.
pub const POLICY_RULE_JSON: &str = r#"{"if":{"not":{"field":"location","in":["northeurope","westeurope"]}},"then":{"effect":"deny"}}"#;

/// Names and inputs for one sample run.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleNames {
    pub resource_group: String,
    pub location: String,
    pub policy_definition: String,
    pub enforced_assignment: String,
    pub relaxed_assignment: String,
    pub policy_rule_json: String,
}

impl Default for SampleNames {
    fn default() -> Self {
        SampleNames {
            resource_group: "rgRSMPA".to_string(),
            location: "westus".to_string(),
            policy_definition: "pdn".to_string(),
            enforced_assignment: "pan1".to_string(),
            relaxed_assignment: "pan2".to_string(),
            policy_rule_json: POLICY_RULE_JSON.to_string(),
        }
    }
}

impl SampleNames {
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        validate_resource_group_name(&self.resource_group)?;
        validate_policy_name(&self.policy_definition)?;
        validate_policy_name(&self.enforced_assignment)?;
        validate_policy_name(&self.relaxed_assignment)?;
        if self.enforced_assignment == self.relaxed_assignment {
            return Err(format!(
                "Assignment names must differ, both are '{}'",
                self.enforced_assignment
            )
            .into());
        }
        if self.location.trim().is_empty() {
            return Err("Location must not be empty".into());
        }
        Ok(())
    }
}

/// Subscription from settings, or the first one the caller can see.
pub async fn resolve_subscription_id<A>(
    api: &A,
    settings: &Settings,
) -> Result<String, Box<dyn Error>>
where
    A: ResourceApi + ?Sized,
{
    if let Some(id) = &settings.subscription_id {
        log::info!("Using subscription from environment: {id}");
        return Ok(id.clone());
    }
    log::warn!("AZURE_SUBSCRIPTION_ID not set, using the first listed subscription");
    let subscriptions = api.list_subscriptions().await?;
    let first = subscriptions
        .into_iter()
        .next()
        .ok_or("No subscriptions visible to the current credential")?;
    log::info!(
        "Default subscription: {} ({})",
        first.subscription_id,
        first.display_name
    );
    Ok(first.subscription_id)
}

/// Run the whole sample against `api`.
///
/// Returns the assignment ids listed in the resource group. Errors from the
/// main sequence are returned after cleanup; cleanup errors are only logged.
pub async fn run_sample<A>(
    api: &A,
    subscription_id: &str,
    names: &SampleNames,
) -> Result<Vec<ResourceId>, Box<dyn Error>>
where
    A: ResourceApi + ?Sized,
{
    names.validate()?;

    let resource_group_id = ResourceId::resource_group(subscription_id, &names.resource_group);
    let result = provision_and_teardown(api, subscription_id, &resource_group_id, names).await;

    delete_resource_group(api, &resource_group_id).await;

    result
}

async fn provision_and_teardown<A>(
    api: &A,
    subscription_id: &str,
    resource_group_id: &ResourceId,
    names: &SampleNames,
) -> Result<Vec<ResourceId>, Box<dyn Error>>
where
    A: ResourceApi + ?Sized,
{
    //=============================================================
    // Create resource group.
    output::print_step("Creating", "a resource group with name", &names.resource_group);
    let created_on = chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let group = ResourceGroup::new(&names.location)
        .with_tag("createdBy", env!("CARGO_PKG_NAME"))
        .with_tag("createdOn", &created_on);
    let group = api.create_resource_group(resource_group_id, &group).await?;
    let resource_group_id = group.id.unwrap_or_else(|| resource_group_id.clone());
    output::print_created("Resource group", resource_group_id.as_str());

    //=============================================================
    // Create policy definition.
    output::print_step("Creating", "a policy definition with name", &names.policy_definition);
    let definition = PolicyDefinition::custom(&names.policy_rule_json)?;
    let definition_id =
        ResourceId::subscription_policy_definition(subscription_id, &names.policy_definition);
    let definition = api.create_policy_definition(&definition_id, &definition).await?;
    let definition_id = definition.id.unwrap_or(definition_id);
    output::print_created("Policy definition", definition_id.as_str());

    //=============================================================
    // Create two policy assignments, one enforced and one not.
    let mut assignment_ids = Vec::with_capacity(2);
    for (name, mode) in [
        (&names.enforced_assignment, EnforcementMode::Default),
        (&names.relaxed_assignment, EnforcementMode::DoNotEnforce),
    ] {
        output::print_step("Creating", "a policy assignment with name", name);
        let assignment_id = ResourceId::policy_assignment(&resource_group_id, name);
        let assignment = PolicyAssignment::new(&definition_id, mode);
        let assignment = api.create_policy_assignment(&assignment_id, &assignment).await?;
        let assignment_id = assignment.id.unwrap_or(assignment_id);
        output::print_created("Policy assignment", assignment_id.as_str());
        assignment_ids.push((name, assignment_id));
    }

    //=============================================================
    // List policy assignments.
    println!("Listing all policy assignments: ");
    let listed = api.list_policy_assignments(&resource_group_id).await?;
    for assignment in &listed {
        output::print_assignment(assignment);
    }
    let listed_ids: Vec<ResourceId> = listed.into_iter().filter_map(|a| a.id).collect();
    log::info!("Listed {} policy assignments", listed_ids.len());

    //=============================================================
    // Delete policy assignments, then the definition they reference.
    for (name, assignment_id) in &assignment_ids {
        output::print_step("Deleting", "policy assignment", name);
        api.delete_policy_assignment(assignment_id).await?;
        output::print_deleted("policy assignment", name);
    }

    output::print_step("Deleting", "policy definition", &names.policy_definition);
    api.delete_policy_definition(&definition_id).await?;
    output::print_deleted("policy definition", &names.policy_definition);

    Ok(listed_ids)
}

/// Best effort resource group delete; failures are logged and swallowed.
async fn delete_resource_group<A>(api: &A, resource_group_id: &ResourceId)
where
    A: ResourceApi + ?Sized,
{
    let name = &resource_group_id.name;
    output::print_step("Deleting", "Resource Group", name);
    match api.delete_resource_group(resource_group_id).await {
        Ok(()) => output::print_deleted("Resource Group", name),
        Err(e) => {
            log::error!("Cleanup of resource group {resource_group_id} failed: {e}");
            println!("{} deleting Resource Group {name}: {e}", "Failed".on_red());
        }
    }
}
