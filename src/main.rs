use azure_policy_assignment::config::Settings;
use azure_policy_assignment::logging::{init_logging, LOG_CONFIG_FILE};
use colored::Colorize;

#[tokio::main]
async fn main() {
    // Do as little as possible in main.rs as it can't contain any tests
    if let Err(e) = init_logging(LOG_CONFIG_FILE) {
        eprintln!("Error initializing logging: {e}");
    }
    dotenv::dotenv().ok();
    //
    log::info!("#Start main()");

    let result = match Settings::from_env() {
        Ok(settings) => azure_policy_assignment::run(&settings).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        log::error!("Sample failed: {e}");
        println!("{} {e}", "ERROR".on_red());
    }
    log::info!("#End main()");
}
