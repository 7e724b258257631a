use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// How long a checkout may sit on a slot before the hold is reclaimed.
    pub slot_hold_seconds: u64,
    /// Step between candidate start times on the availability grid.
    pub granularity_minutes: u32,
    /// Maximum span accepted by the date-range availability query.
    #[serde(default = "default_max_range_days")]
    pub max_range_days: u32,
    #[serde(default = "default_reaper_interval")]
    pub reaper_interval_seconds: u64,
}

fn default_max_range_days() -> u32 {
    30
}

fn default_reaper_interval() -> u64 {
    60
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Layer the current environment file on top (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Finally environment variables, e.g. KAIROS__SERVER__PORT=8080
            .add_source(config::Environment::with_prefix("KAIROS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
