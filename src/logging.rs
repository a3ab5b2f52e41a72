//! log4rs setup.
//!
//! Reads `log4rs.yml` from the working directory, falling back to a stderr
//! appender at `warn` when the file is missing or invalid.

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::error::Error;
use std::path::Path;

pub const LOG_CONFIG_FILE: &str = "log4rs.yml";
const FALLBACK_PATTERN: &str = "{d(%H:%M:%S)} {h({l:5})} {t} - {m}{n}";

/// Initialise the global logger once.
pub fn init_logging(config_file: &str) -> Result<(), Box<dyn Error>> {
    if Path::new(config_file).exists() {
        match log4rs::init_file(config_file, Default::default()) {
            Ok(()) => return Ok(()),
            Err(e) => {
                eprintln!("Error initializing log4rs from {config_file}: {e}, using fallback")
            }
        }
    }
    log4rs::init_config(fallback_config(LevelFilter::Warn)?)?;
    Ok(())
}

fn fallback_config(level: LevelFilter) -> Result<Config, Box<dyn Error>> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(FALLBACK_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_config_builds() {
        let config = fallback_config(LevelFilter::Debug).expect("config");
        assert_eq!(config.root().level(), LevelFilter::Debug);
        assert_eq!(config.appenders().len(), 1);
    }
}
