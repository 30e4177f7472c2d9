//! Service configuration.

use backoffice_core::error::AppError;
use chrono::NaiveDate;
use config::{Config as Cfg, File};
use serde::Deserialize;

use crate::services::invoices::DeletePolicy;
use crate::services::split::{default_milestone_date, SplitPolicy};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub split: SplitSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Revenue-split policy knobs. The milestone date is configuration, not a
/// code constant.
#[derive(Debug, Deserialize, Clone)]
pub struct SplitSettings {
    #[serde(default = "default_milestone_date")]
    pub milestone_date: NaiveDate,
    #[serde(default)]
    pub delete_policy: DeletePolicy,
}

impl SplitSettings {
    pub fn policy(&self) -> SplitPolicy {
        SplitPolicy::with_milestone(self.milestone_date)
    }
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            milestone_date: default_milestone_date(),
            delete_policy: DeletePolicy::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

impl Settings {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
