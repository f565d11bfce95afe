use axum::Router;
use std::{
    cmp::Ordering,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use tower_http::services::{ServeDir, ServeFile};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATIC_DIR: &str = "dist";
const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;
const INDEX_DOCUMENT: &str = "index.html";

const PORT_BOUNDS: (u16, u16) = (1, u16::MAX);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
}

impl PartialOrd for LogLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(level: LogLevel) -> u8 {
            match level {
                LogLevel::Debug => 0,
                LogLevel::Info => 1,
            }
        }

        rank(*self).cmp(&rank(*other))
    }
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
        }
    }
}

/// Runtime settings for the static host, read once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct HostConfig {
    pub port: u16,
    pub static_dir: PathBuf,
    pub log_level: LogLevel,
}

impl HostConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: parse_u16_with_bounds(lookup("PORT").as_deref(), DEFAULT_PORT, PORT_BOUNDS),
            static_dir: parse_non_empty_string(lookup("STATIC_DIR").as_deref())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            log_level: parse_log_level(lookup("LOG_LEVEL").as_deref(), DEFAULT_LOG_LEVEL),
        }
    }
}

/// Serves the built page, falling back to `index.html` for unknown paths.
pub fn router(static_dir: &Path) -> Router {
    let static_service = ServeDir::new(static_dir)
        .not_found_service(ServeFile::new(static_dir.join(INDEX_DOCUMENT)));
    Router::new().fallback_service(static_service)
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = HostConfig::from_env();
    let bind_address = SocketAddr::from(([0, 0, 0, 0], config.port));

    if !config.static_dir.join(INDEX_DOCUMENT).is_file() {
        log_event(
            &config,
            LogLevel::Info,
            "static_dir_missing_index",
            serde_json::json!({ "static_dir": config.static_dir.display().to_string() }),
        );
    }

    let app = router(&config.static_dir);
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    log_event(
        &config,
        LogLevel::Info,
        "server_listening",
        serde_json::json!({
            "url": format!("http://127.0.0.1:{}", config.port),
            "static_dir": config.static_dir.display().to_string(),
        }),
    );
    log_event(
        &config,
        LogLevel::Debug,
        "host_config",
        serde_json::json!({
            "port": config.port,
            "log_level": config.log_level.as_str(),
        }),
    );
    axum::serve(listener, app).await?;
    Ok(())
}

fn parse_u16_with_bounds(value: Option<&str>, default: u16, bounds: (u16, u16)) -> u16 {
    value
        .and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|value| (bounds.0..=bounds.1).contains(value))
        .unwrap_or(default)
}

fn parse_non_empty_string(value: Option<&str>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_log_level(value: Option<&str>, default: LogLevel) -> LogLevel {
    match parse_non_empty_string(value)
        .unwrap_or_else(|| default.as_str().to_string())
        .to_ascii_lowercase()
        .as_str()
    {
        "debug" => LogLevel::Debug,
        "info" => LogLevel::Info,
        _ => default,
    }
}

fn event_payload(level: LogLevel, event: &str, fields: serde_json::Value) -> serde_json::Value {
    let mut payload = serde_json::Map::new();
    payload.insert(
        "ts".to_string(),
        serde_json::Value::Number(serde_json::Number::from(now_unix_seconds())),
    );
    payload.insert("level".to_string(), serde_json::Value::String(level.as_str().to_string()));
    payload.insert("event".to_string(), serde_json::Value::String(event.to_string()));

    if let serde_json::Value::Object(extra) = fields {
        for (key, value) in extra {
            payload.insert(key, value);
        }
    }

    serde_json::Value::Object(payload)
}

fn log_event(config: &HostConfig, level: LogLevel, event: &str, fields: serde_json::Value) {
    if level < config.log_level {
        return;
    }

    println!("{}", event_payload(level, event, fields));
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_secs())
        .unwrap_or(0)
}
