//! Domain models for Azure policy assignment management.
//!
//! - [`ResourceId`] - ARM resource identifiers
//! - [`ResourceGroup`] - Resource group representation
//! - [`PolicyDefinition`] and [`PolicyAssignment`] - Governance resources
//! - [`Subscription`] and [`Page`] - Listing helpers

mod policy;
mod resource_group;
mod resource_id;
mod subscription;

// Re-export public types
pub use policy::{
    parse_policy_rule, EnforcementMode, PolicyAssignment, PolicyAssignmentProperties,
    PolicyDefinition, PolicyDefinitionProperties, PolicyType,
};
pub use resource_group::{ResourceGroup, ResourceGroupProperties};
pub use resource_id::{
    validate_policy_name, validate_resource_group_name, ResourceId, POLICY_NAMESPACE,
};
pub use subscription::{Page, Subscription};
