// cargo watch -x 'fmt' -x 'run'

pub mod azure;
pub mod config;
pub mod logging;
pub mod models;
pub mod output;
pub mod sample;

use azure::ArmClient;
use config::Settings;
use std::error::Error;

pub use sample::{resolve_subscription_id, run_sample, SampleNames};

/// Authenticate, pick the subscription and run the sample with default names.
pub async fn run(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let client = ArmClient::new(settings);
    let subscription_id = resolve_subscription_id(&client, settings).await?;

    let listed = run_sample(&client, &subscription_id, &SampleNames::default()).await?;
    log::info!("Sample finished, {} assignments were listed", listed.len());
    Ok(())
}
