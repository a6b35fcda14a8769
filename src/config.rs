use std::str::FromStr;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Files compressed concurrently while creating an archive
    pub workers: usize,
    /// fsync the archive and its directory before reporting success
    pub durable_writes: bool,
    pub log_format: LogFormat,
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
}

impl Config {
    pub const MAX_WORKERS: usize = 256;

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            workers: lookup("SIP_WORKERS")
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_workers),
            durable_writes: lookup("SIP_DURABLE_WRITES")
                .and_then(|s| parse_bool(&s))
                .unwrap_or(true),
            log_format: lookup("SIP_LOG_FORMAT")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            log_filter: lookup("SIP_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 || self.workers > Self::MAX_WORKERS {
            return Err(format!(
                "SIP_WORKERS must be between 1 and {}",
                Self::MAX_WORKERS
            ));
        }

        if self.log_filter.trim().is_empty() {
            return Err("SIP_LOG cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(Config::MAX_WORKERS)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
