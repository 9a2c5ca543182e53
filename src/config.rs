use chrono::{FixedOffset, NaiveTime};
use serde::Deserialize;

use crate::domain::Coordinate;

/// Settings for one replan cycle. Loaded from an optional TOML file via the
/// `config` crate, then overridden field-by-field by CLI flags/environment
/// variables (`src/bin/replan.rs`), the same layered pattern `config`
/// itself is built around.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplanConfig {
    /// Working-window start, local to `time_zone_offset_minutes`.
    pub working_window_start: NaiveTimeConfig,
    /// Working-window end, local to `time_zone_offset_minutes`.
    pub working_window_end: NaiveTimeConfig,
    /// Fixed offset from UTC used for all window/weekday arithmetic. The
    /// core never reads host-local time.
    pub time_zone_offset_minutes: i32,
    /// Bound on overflow passes after today's pass.
    pub max_overflow_attempts: u32,
    /// Wall-clock timeout for one solver call, in seconds.
    pub solver_timeout_secs: u64,
    /// Wall-clock timeout for one travel-oracle request, in seconds.
    pub oracle_timeout_secs: u64,
    /// TTL for cached oracle lookups, in minutes.
    pub oracle_cache_ttl_minutes: i64,
    /// Upper bound on concurrent in-flight oracle requests per matrix build.
    pub oracle_concurrency: usize,
    /// Penalty substituted for a failed oracle lookup.
    pub oracle_failure_penalty_seconds: i64,
    /// The solver's HTTP endpoint.
    pub solver_endpoint: String,
    /// Fixed depot coordinate used as every technician's route end.
    pub depot: Coordinate,
}

impl Default for ReplanConfig {
    fn default() -> Self {
        Self {
            working_window_start: NaiveTimeConfig(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
            working_window_end: NaiveTimeConfig(NaiveTime::from_hms_opt(18, 30, 0).unwrap()),
            time_zone_offset_minutes: 0,
            max_overflow_attempts: 4,
            solver_timeout_secs: 120,
            oracle_timeout_secs: 5,
            oracle_cache_ttl_minutes: 60,
            oracle_concurrency: 8,
            oracle_failure_penalty_seconds: 999_999,
            solver_endpoint: "http://localhost:8080/solve".to_string(),
            depot: Coordinate::new(0.0, 0.0),
        }
    }
}

impl ReplanConfig {
    pub fn time_zone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.time_zone_offset_minutes * 60)
            .expect("offset built from config must fit in a day")
    }

    /// Load defaults, then layer a TOML file (if present) and `REPLAN_*`
    /// environment variables on top, mirroring `config`'s usual
    /// `File`-then-`Environment` source order.
    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let defaults = ReplanConfig::default();
        let mut builder = config::Config::builder()
            .set_default(
                "working_window_start",
                defaults.working_window_start.0.format("%H:%M:%S").to_string(),
            )?
            .set_default(
                "working_window_end",
                defaults.working_window_end.0.format("%H:%M:%S").to_string(),
            )?
            .set_default("time_zone_offset_minutes", defaults.time_zone_offset_minutes as i64)?
            .set_default("max_overflow_attempts", defaults.max_overflow_attempts as i64)?
            .set_default("solver_timeout_secs", defaults.solver_timeout_secs as i64)?
            .set_default("oracle_timeout_secs", defaults.oracle_timeout_secs as i64)?
            .set_default("oracle_cache_ttl_minutes", defaults.oracle_cache_ttl_minutes)?
            .set_default("oracle_concurrency", defaults.oracle_concurrency as i64)?
            .set_default(
                "oracle_failure_penalty_seconds",
                defaults.oracle_failure_penalty_seconds,
            )?
            .set_default("solver_endpoint", defaults.solver_endpoint.clone())?
            .set_default("depot.lat", defaults.depot.lat)?
            .set_default("depot.lon", defaults.depot.lon)?;
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix("REPLAN").separator("__"));
        builder.build()?.try_deserialize()
    }
}

/// `chrono::NaiveTime` does not implement `Serialize`/`Deserialize` in a
/// format the `config` crate can round-trip through its generic `Value`, so
/// it is wrapped and (de)serialized as an `"HH:MM:SS"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaiveTimeConfig(pub NaiveTime);

impl serde::Serialize for NaiveTimeConfig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.format("%H:%M:%S").to_string())
    }
}

impl<'de> serde::Deserialize<'de> for NaiveTimeConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .map(NaiveTimeConfig)
            .map_err(serde::de::Error::custom)
    }
}
