//! Azure Resource Manager interaction.
//!
//! This module handles all Azure-related operations:
//! - [`auth`] - Bearer tokens from the ambient credential chain
//! - [`arm`] - REST calls, LRO polling and pagination
//! - [`api`] - Typed resource operations behind the [`ResourceApi`] trait

mod api;
mod arm;
mod auth;

// Re-export public types and functions
pub use api::ResourceApi;
pub use arm::{ArmClient, ArmError};
pub use auth::{AmbientCredential, StaticToken, TokenSource};
