//! Typed resource operations used by the sample.
//!
//! [`ResourceApi`] is the seam between the orchestration in
//! [`crate::sample`] and the remote API, implemented here for [`ArmClient`].
//! Every call waits for the remote long-running operation to complete.

use super::arm::ArmClient;
use crate::config;
use crate::models::{
    PolicyAssignment, PolicyDefinition, ResourceGroup, ResourceId, Subscription,
};
use async_trait::async_trait;
use std::error::Error;

#[async_trait(?Send)]
pub trait ResourceApi {
    /// Subscriptions visible to the caller, in service order.
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, Box<dyn Error>>;

    async fn create_resource_group(
        &self,
        id: &ResourceId,
        group: &ResourceGroup,
    ) -> Result<ResourceGroup, Box<dyn Error>>;

    async fn delete_resource_group(&self, id: &ResourceId) -> Result<(), Box<dyn Error>>;

    async fn create_policy_definition(
        &self,
        id: &ResourceId,
        definition: &PolicyDefinition,
    ) -> Result<PolicyDefinition, Box<dyn Error>>;

    async fn delete_policy_definition(&self, id: &ResourceId) -> Result<(), Box<dyn Error>>;

    async fn create_policy_assignment(
        &self,
        id: &ResourceId,
        assignment: &PolicyAssignment,
    ) -> Result<PolicyAssignment, Box<dyn Error>>;

    /// Assignments that apply to `scope`, including inherited ones.
    async fn list_policy_assignments(
        &self,
        scope: &ResourceId,
    ) -> Result<Vec<PolicyAssignment>, Box<dyn Error>>;

    async fn delete_policy_assignment(&self, id: &ResourceId) -> Result<(), Box<dyn Error>>;
}

#[async_trait(?Send)]
impl ResourceApi for ArmClient {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, Box<dyn Error>> {
        self.list("/subscriptions", config::API_VERSION_SUBSCRIPTIONS).await
    }

    async fn create_resource_group(
        &self,
        id: &ResourceId,
        group: &ResourceGroup,
    ) -> Result<ResourceGroup, Box<dyn Error>> {
        self.put_and_wait(id.as_str(), config::API_VERSION_RESOURCE_GROUPS, group).await
    }

    async fn delete_resource_group(&self, id: &ResourceId) -> Result<(), Box<dyn Error>> {
        self.delete_and_wait(id.as_str(), config::API_VERSION_RESOURCE_GROUPS).await
    }

    async fn create_policy_definition(
        &self,
        id: &ResourceId,
        definition: &PolicyDefinition,
    ) -> Result<PolicyDefinition, Box<dyn Error>> {
        self.put_and_wait(id.as_str(), config::API_VERSION_POLICY, definition).await
    }

    async fn delete_policy_definition(&self, id: &ResourceId) -> Result<(), Box<dyn Error>> {
        self.delete_and_wait(id.as_str(), config::API_VERSION_POLICY).await
    }

    async fn create_policy_assignment(
        &self,
        id: &ResourceId,
        assignment: &PolicyAssignment,
    ) -> Result<PolicyAssignment, Box<dyn Error>> {
        self.put_and_wait(id.as_str(), config::API_VERSION_POLICY, assignment).await
    }

    async fn list_policy_assignments(
        &self,
        scope: &ResourceId,
    ) -> Result<Vec<PolicyAssignment>, Box<dyn Error>> {
        let path = format!(
            "{scope}/providers/{}/policyAssignments",
            crate::models::POLICY_NAMESPACE
        );
        self.list(&path, config::API_VERSION_POLICY).await
    }

    async fn delete_policy_assignment(&self, id: &ResourceId) -> Result<(), Box<dyn Error>> {
        self.delete_and_wait(id.as_str(), config::API_VERSION_POLICY).await
    }
}
