use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use crate::error::LogscopeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Session gap used when nothing else is configured.
pub const DEFAULT_SESSION_MINUTES: u64 = 30;

/// Top-level logscope configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogscopeConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub geo: GeoConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where the raw log comes from and where parse output goes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_logfile")]
    pub logfile: PathBuf,
    /// Parsed records are flushed here in chunk files.
    #[serde(default = "default_chunk_dir")]
    pub chunk_dir: PathBuf,
    /// Unparsable lines are appended here.
    #[serde(default = "default_errors_file")]
    pub errors_file: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeoEndpoint {
    /// `GET /lite/{ip}`, answer field `country_code`.
    Lite,
    /// `GET /{ip}/json`, answer field `country`.
    Standard,
}

/// IP geolocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// API token (`IPINFO_TOKEN`).
    #[serde(default)]
    pub token: Option<String>,
    /// Persistent cache (`CACHE_FILE`). `None` keeps the cache in memory only.
    #[serde(default = "default_cache_file")]
    pub cache_file: Option<PathBuf>,
    #[serde(default = "default_endpoint")]
    pub endpoint: GeoEndpoint,
    /// Override of the API host, e.g. for a local mock.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Pause after each network lookup.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Requests from one client closer than this belong to the same session.
    #[serde(default = "default_pipeline_session_minutes")]
    pub minutes: u64,
}

/// Which columns the `run` pipeline drops, scales and encodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_drop_columns")]
    pub drop_columns: Vec<String>,
    #[serde(default = "default_normalize")]
    pub normalize: Vec<String>,
    #[serde(default = "default_one_hot")]
    pub one_hot: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_head")]
    pub head: usize,
    #[serde(default = "default_top_sessions")]
    pub top_sessions: usize,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_logfile() -> PathBuf { PathBuf::from("./data/logs_10k.log") }
fn default_chunk_dir() -> PathBuf { PathBuf::from("temp_dir") }
fn default_errors_file() -> PathBuf { PathBuf::from("errors.txt") }
fn default_chunk_size() -> usize { 250_000 }
fn default_true() -> bool { true }
fn default_cache_file() -> Option<PathBuf> { Some(PathBuf::from("cache.json")) }
fn default_endpoint() -> GeoEndpoint { GeoEndpoint::Lite }
fn default_delay_ms() -> u64 { 5 }
fn default_timeout_secs() -> u64 { 5 }
fn default_pipeline_session_minutes() -> u64 { 20 }
fn default_drop_columns() -> Vec<String> { vec!["userid".into(), "client".into()] }
fn default_normalize() -> Vec<String> {
    vec![
        "datetime_delta_ms".into(),
        "datetime_delta_ms_in_session".into(),
        "size_in_bytes".into(),
    ]
}
fn default_one_hot() -> Vec<String> { vec!["method".into()] }
fn default_head() -> usize { 5 }
fn default_top_sessions() -> usize { 50 }

// ── Impls ─────────────────────────────────────────────────────

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            logfile: default_logfile(),
            chunk_dir: default_chunk_dir(),
            errors_file: default_errors_file(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            token: None,
            cache_file: default_cache_file(),
            endpoint: default_endpoint(),
            base_url: None,
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            minutes: default_pipeline_session_minutes(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            drop_columns: default_drop_columns(),
            normalize: default_normalize(),
            one_hot: default_one_hot(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            head: default_head(),
            top_sessions: default_top_sessions(),
        }
    }
}

impl LogscopeConfig {
    /// Load configuration: optional YAML file, then `IPINFO_TOKEN` / `CACHE_FILE`,
    /// then `LOGSCOPE_`-prefixed overrides (`LOGSCOPE_GEO__DELAY_MS=10`).
    pub fn load(path: Option<&Path>) -> Result<Self, LogscopeError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: LogscopeConfig = figment
            .merge(Env::raw().only(&["IPINFO_TOKEN", "CACHE_FILE"]).map(|key| {
                if key.as_str().eq_ignore_ascii_case("IPINFO_TOKEN") {
                    "geo.token".into()
                } else {
                    "geo.cache_file".into()
                }
            }))
            .merge(Env::prefixed("LOGSCOPE_").split("__"))
            .extract()
            .map_err(|e| LogscopeError::Config(e.to_string()))?;
        config.validate()?;
        tracing::debug!(
            logfile = %config.input.logfile.display(),
            chunk_size = config.input.chunk_size,
            geo_enabled = config.geo.enabled,
            has_token = config.geo_token().is_some(),
            session_minutes = config.sessions.minutes,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), LogscopeError> {
        if self.input.chunk_size == 0 {
            return Err(LogscopeError::Config(
                "input.chunk_size must be greater than zero".into(),
            ));
        }
        if self.sessions.minutes == 0 {
            return Err(LogscopeError::Config(
                "sessions.minutes must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Token with surrounding whitespace removed; blank counts as unset.
    pub fn geo_token(&self) -> Option<&str> {
        self.geo
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // ── Default values ────────────────────────────────────────────

    #[test]
    fn default_input_config_has_expected_values() {
        let cfg = InputConfig::default();
        assert_eq!(cfg.logfile, PathBuf::from("./data/logs_10k.log"));
        assert_eq!(cfg.chunk_dir, PathBuf::from("temp_dir"));
        assert_eq!(cfg.errors_file, PathBuf::from("errors.txt"));
        assert_eq!(cfg.chunk_size, 250_000);
    }

    #[test]
    fn default_geo_config_uses_lite_and_cache_json() {
        let cfg = GeoConfig::default();
        assert!(cfg.enabled);
        assert!(cfg.token.is_none());
        assert_eq!(cfg.cache_file, Some(PathBuf::from("cache.json")));
        assert_eq!(cfg.endpoint, GeoEndpoint::Lite);
        assert_eq!(cfg.delay_ms, 5);
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn default_pipeline_columns() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.drop_columns, vec!["userid", "client"]);
        assert_eq!(cfg.normalize.len(), 3);
        assert_eq!(cfg.one_hot, vec!["method"]);
    }

    #[test]
    fn default_session_minutes_is_twenty_for_pipeline() {
        assert_eq!(SessionConfig::default().minutes, 20);
        assert_eq!(DEFAULT_SESSION_MINUTES, 30);
    }

    #[test]
    fn blank_token_counts_as_unset() {
        let mut cfg = LogscopeConfig::default();
        cfg.geo.token = Some("   ".into());
        assert!(cfg.geo_token().is_none());
        cfg.geo.token = Some(" abc ".into());
        assert_eq!(cfg.geo_token(), Some("abc"));
    }

    #[test]
    fn validate_rejects_zero_chunk_size() {
        let mut cfg = LogscopeConfig::default();
        cfg.input.chunk_size = 0;
        assert!(matches!(cfg.validate(), Err(LogscopeError::Config(_))));
    }

    // ── GeoEndpoint serde ─────────────────────────────────────────

    #[test]
    fn geo_endpoint_serializes_to_lowercase() {
        assert_eq!(serde_json::to_string(&GeoEndpoint::Lite).unwrap(), "\"lite\"");
        assert_eq!(
            serde_json::to_string(&GeoEndpoint::Standard).unwrap(),
            "\"standard\""
        );
    }

    // ── LogscopeConfig::load() ────────────────────────────────────

    #[test]
    fn load_from_valid_yaml_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
            write!(
                tmpfile,
                "input:\n  chunk_size: 1000\nsessions:\n  minutes: 45\ngeo:\n  endpoint: standard\n  cache_file: null\n"
            )
            .unwrap();
            let cfg = LogscopeConfig::load(Some(tmpfile.path())).unwrap();
            assert_eq!(cfg.input.chunk_size, 1000);
            assert_eq!(cfg.sessions.minutes, 45);
            assert_eq!(cfg.geo.endpoint, GeoEndpoint::Standard);
            assert!(cfg.geo.cache_file.is_none());
            // Defaults still apply for unspecified fields
            assert_eq!(cfg.input.errors_file, PathBuf::from("errors.txt"));
            Ok(())
        });
    }

    #[test]
    fn legacy_env_vars_fill_token_and_cache() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("IPINFO_TOKEN", "tok123");
            jail.set_env("CACHE_FILE", "geo-cache.json");
            let cfg = LogscopeConfig::load(None).unwrap();
            assert_eq!(cfg.geo_token(), Some("tok123"));
            assert_eq!(cfg.geo.cache_file, Some(PathBuf::from("geo-cache.json")));
            Ok(())
        });
    }

    #[test]
    fn prefixed_env_wins_over_legacy_env() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("IPINFO_TOKEN", "legacy");
            jail.set_env("LOGSCOPE_GEO__TOKEN", "prefixed");
            jail.set_env("LOGSCOPE_SESSIONS__MINUTES", "15");
            let cfg = LogscopeConfig::load(None).unwrap();
            assert_eq!(cfg.geo_token(), Some("prefixed"));
            assert_eq!(cfg.sessions.minutes, 15);
            Ok(())
        });
    }

    #[test]
    fn load_rejects_zero_session_minutes() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("logscope.yaml", "sessions:\n  minutes: 0\n")?;
            let err = LogscopeConfig::load(Some(Path::new("logscope.yaml"))).unwrap_err();
            assert!(matches!(err, LogscopeError::Config(ref msg) if msg.contains("sessions.minutes")));
            assert_eq!(err.exit_code(), 2);
            Ok(())
        });
    }

    #[test]
    fn load_reports_malformed_values_as_config_error() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("logscope.yaml", "input:\n  chunk_size: lots\n")?;
            let err = LogscopeConfig::load(Some(Path::new("logscope.yaml"))).unwrap_err();
            assert!(matches!(err, LogscopeError::Config(_)));
            assert_eq!(err.exit_code(), 2);
            Ok(())
        });
    }
}
