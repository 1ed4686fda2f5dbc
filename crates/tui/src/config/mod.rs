use std::path::PathBuf;

use chrono::{NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use clap::Parser;
use engine::{BillCatalog, Category, CategoryCatalog};
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/kakeibo.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// `user:api_key`. When empty the login screen asks for it.
    pub credentials: String,
    pub timezone: String,
    pub idle_reset_minutes: i64,
    pub download_dir: PathBuf,
    pub log_level: String,
    pub log_file: PathBuf,
    pub categories: Vec<Category>,
    pub bills: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            credentials: String::new(),
            timezone: "Asia/Tokyo".to_string(),
            idle_reset_minutes: 60,
            download_dir: PathBuf::from("."),
            log_level: "info".to_string(),
            log_file: PathBuf::from("kakeibo-tui.log"),
            categories: Vec::new(),
            bills: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| AppError::Timezone(self.timezone.clone()))
    }

    pub fn idle_reset(&self) -> TimeDelta {
        TimeDelta::minutes(self.idle_reset_minutes.max(1))
    }

    pub fn catalog(&self) -> CategoryCatalog {
        CategoryCatalog::new(self.categories.clone())
    }

    pub fn bills(&self) -> BillCatalog {
        BillCatalog::new(self.bills.clone())
    }
}

/// Today's date where the household lives, not where the terminal runs.
pub fn today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

#[derive(Debug, Parser)]
#[command(name = "kakeibo-tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:8000).
    #[arg(long)]
    base_url: Option<String>,
    /// Override credentials, as `user:api_key`.
    #[arg(long)]
    credentials: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    /// Override the directory reports are downloaded to.
    #[arg(long)]
    download_dir: Option<PathBuf>,
    /// Override log level (error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let builder = config::Config::builder()
        .add_source(config::File::with_name(config_path).required(false))
        .add_source(config::Environment::with_prefix("KAKEIBO"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(credentials) = args.credentials {
        settings.credentials = credentials;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(download_dir) = args.download_dir {
        settings.download_dir = download_dir;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }

    Ok(settings)
}
