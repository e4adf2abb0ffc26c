use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use log::LevelFilter;
use plate_engine::{ensure_state_dir, ApiSettings, PollerTimings};

use super::logging::LogDestination;

const LOG_FILENAME: &str = "plate.log";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub timings: PollerTimings,
    pub state_dir: PathBuf,
    pub log_destination: LogDestination,
    pub log_level: LevelFilter,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = non_empty("PLATE_API_URL")
            .ok_or_else(|| anyhow!("PLATE_API_URL must point at the meal analysis backend"))?;
        let mut api = ApiSettings::new(base_url.trim());
        if let Some(raw) = non_empty("PLATE_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("PLATE_REQUEST_TIMEOUT_SECS is not a number: {raw}"))?;
            if secs == 0 {
                bail!("PLATE_REQUEST_TIMEOUT_SECS must be positive");
            }
            api.request_timeout = Duration::from_secs(secs);
        }

        let state_dir = non_empty("PLATE_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let log_destination = match non_empty("PLATE_LOG") {
            Some(raw) => LogDestination::parse(&raw)
                .ok_or_else(|| anyhow!("PLATE_LOG must be file, terminal or both, got {raw}"))?,
            None => LogDestination::File,
        };
        let log_level = match non_empty("PLATE_LOG_LEVEL") {
            Some(raw) => plate_logging::parse_level(&raw)
                .ok_or_else(|| anyhow!("PLATE_LOG_LEVEL is not a log level: {raw}"))?,
            None => LevelFilter::Info,
        };

        Ok(Self {
            api,
            timings: PollerTimings::default(),
            state_dir,
            log_destination,
            log_level,
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join(LOG_FILENAME)
    }

    /// Creates the state directory so the log file and store can live in it.
    pub fn prepare_state_dir(&self) -> anyhow::Result<()> {
        ensure_state_dir(&self.state_dir)
            .with_context(|| format!("Cannot use state directory {:?}", self.state_dir))
    }
}
