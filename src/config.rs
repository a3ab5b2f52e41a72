//! Runtime configuration and fixed ARM constants.
//!
//! Settings come from the environment (a `.env` file is loaded by `main`).

use std::error::Error;
use std::time::Duration;

/// Default Azure Resource Manager endpoint (public cloud).
pub const ARM_ENDPOINT: &str = "https://management.azure.com";
/// OAuth scope requested for ARM bearer tokens.
pub const ARM_SCOPE: &str = "https://management.azure.com/.default";

pub const API_VERSION_RESOURCE_GROUPS: &str = "2021-04-01";
pub const API_VERSION_POLICY: &str = "2021-06-01";
pub const API_VERSION_SUBSCRIPTIONS: &str = "2020-01-01";

/// Seconds between LRO polls when the service sends no `Retry-After`.
pub const POLL_INTERVAL_SECS: u64 = 5;
/// Upper bound on LRO polls before giving up (~30 min at the default interval).
pub const MAX_POLLS: u32 = 360;

pub const ENV_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
pub const ENV_ARM_ENDPOINT: &str = "AZURE_RESOURCE_MANAGER_URL";
pub const ENV_POLL_INTERVAL: &str = "ARM_POLL_INTERVAL_SECS";

/// Settings resolved at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Target subscription. `None` means use the first subscription listed.
    pub subscription_id: Option<String>,
    /// Base URL of the management API, without trailing slash.
    pub arm_endpoint: String,
    /// Default wait between LRO polls.
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            subscription_id: None,
            arm_endpoint: ARM_ENDPOINT.to_string(),
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            max_polls: MAX_POLLS,
        }
    }
}

impl Settings {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Settings, Box<dyn Error>> {
        Settings::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (env in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, Box<dyn Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        settings.subscription_id = lookup(ENV_SUBSCRIPTION_ID)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if let Some(endpoint) = lookup(ENV_ARM_ENDPOINT).filter(|s| !s.trim().is_empty()) {
            settings.arm_endpoint = endpoint.trim().trim_end_matches('/').to_string();
        }

        if let Some(secs) = lookup(ENV_POLL_INTERVAL) {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| format!("Invalid {ENV_POLL_INTERVAL}='{secs}': {e}"))?;
            settings.poll_interval = Duration::from_secs(secs);
        }

        log::debug!("Settings resolved: {:?}", settings);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let settings = Settings::from_lookup(lookup_from(&[])).expect("settings");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.arm_endpoint, "https://management.azure.com");
    }

    #[test]
    fn test_subscription_and_endpoint_override() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("AZURE_SUBSCRIPTION_ID", " 00000000-1111-2222-3333-444444444444 "),
            ("AZURE_RESOURCE_MANAGER_URL", "https://management.usgovcloudapi.net/"),
            ("ARM_POLL_INTERVAL_SECS", "1"),
        ]))
        .expect("settings");
        assert_eq!(
            settings.subscription_id.as_deref(),
            Some("00000000-1111-2222-3333-444444444444")
        );
        assert_eq!(settings.arm_endpoint, "https://management.usgovcloudapi.net");
        assert_eq!(settings.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_blank_subscription_is_none() {
        let settings =
            Settings::from_lookup(lookup_from(&[("AZURE_SUBSCRIPTION_ID", "  ")]))
                .expect("settings");
        assert!(settings.subscription_id.is_none());
    }

    #[test]
    fn test_bad_poll_interval() {
        let err = Settings::from_lookup(lookup_from(&[("ARM_POLL_INTERVAL_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("ARM_POLL_INTERVAL_SECS"), "got: {err}");
    }
}
