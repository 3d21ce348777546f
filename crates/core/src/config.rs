use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};

/// Runtime configuration, resolved once at startup from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub public_dir: PathBuf,
    pub watch_interval: Duration,
    pub extract_command: String,
    pub extract_timeout: Option<Duration>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let data_dir = env::var("GSTDESK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        let public_dir = env::var("GSTDESK_PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PUBLIC_DIR));
        let watch_interval_ms = env::var("GSTDESK_WATCH_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_WATCH_INTERVAL_MS);
        let extract_command =
            env::var("GSTDESK_EXTRACT_CMD").unwrap_or_else(|_| DEFAULT_EXTRACT_CMD.to_string());
        if extract_command.split_whitespace().next().is_none() {
            return Err(anyhow!("GSTDESK_EXTRACT_CMD must not be empty"));
        }
        let extract_timeout_secs = env::var("GSTDESK_EXTRACT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_EXTRACT_TIMEOUT_SECS);
        Ok(Self {
            host,
            port,
            data_dir,
            public_dir,
            watch_interval: Duration::from_millis(watch_interval_ms),
            extract_command,
            extract_timeout: match extract_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        })
    }

    pub fn primary_path(&self) -> PathBuf {
        self.data_dir.join(PRIMARY_DATA_FILE)
    }

    pub fn fallback_path(&self) -> PathBuf {
        self.data_dir.join(FALLBACK_DATA_FILE)
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join(UPLOADS_DIR)
    }
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5050;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PUBLIC_DIR: &str = "public";
const DEFAULT_WATCH_INTERVAL_MS: u64 = 1000;
const DEFAULT_EXTRACT_CMD: &str = "python3 tools/pdf_extraction_tool.py";
const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 300;

const PRIMARY_DATA_FILE: &str = "gst_data.json";
const FALLBACK_DATA_FILE: &str = "db.json";
const USERS_FILE: &str = "users.json";
const UPLOADS_DIR: &str = "uploads";
