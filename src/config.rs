//! Tracker configuration loaded from environment variables.
//!
//! Every tunable has a default; `TRACKER_*` variables override them. Values
//! are read once when the tracker is built.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const METERS_PER_MILE: f64 = 1609.34;
const METERS_PER_KILOMETER: f64 = 1000.0;

/// Distance unit used for speed, pace and reward bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl DistanceUnit {
    pub fn meters_per_unit(self) -> f64 {
        match self {
            DistanceUnit::Miles => METERS_PER_MILE,
            DistanceUnit::Kilometers => METERS_PER_KILOMETER,
        }
    }

    /// Convert metres to this unit.
    pub fn from_meters(self, meters: f64) -> f64 {
        meters / self.meters_per_unit()
    }

    /// Convert metres/second to units/hour.
    pub fn per_hour_from_mps(self, mps: f64) -> f64 {
        mps * 3600.0 / self.meters_per_unit()
    }
}

impl std::fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceUnit::Miles => write!(f, "mi"),
            DistanceUnit::Kilometers => write!(f, "km"),
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mi" | "mile" | "miles" => Ok(DistanceUnit::Miles),
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => {
                Ok(DistanceUnit::Kilometers)
            }
            _ => Err(()),
        }
    }
}

/// Thresholds for rejecting noisy location fixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum seconds between accepted fixes
    pub min_interval_secs: f64,
    /// Minimum displacement from the last accepted fix (metres)
    pub min_distance_meters: f64,
    /// Reported speeds below this are stationary jitter (m/s)
    pub min_speed_mps: f64,
    /// Reported speeds above this are GPS spikes (m/s)
    pub max_speed_mps: f64,
    /// Maximum ratio of measured displacement to `speed * elapsed`
    pub max_distance_ratio: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 1.0,
            min_distance_meters: 2.0,
            min_speed_mps: 0.3,
            max_speed_mps: 12.0,
            max_distance_ratio: 5.0,
        }
    }
}

/// Density of the recorded route polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub min_distance_meters: f64,
    pub min_interval_secs: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            min_distance_meters: 10.0,
            min_interval_secs: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Readings kept for the moving-average speed
    pub speed_window: usize,
    /// Below this speed (units/hour) pace keeps its previous value
    pub pace_speed_floor: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            speed_window: 10,
            pace_speed_floor: 0.5,
        }
    }
}

/// Gem award tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub base_gems: u64,
    /// Speed (units/hour) above which the speed bonus starts
    pub speed_bonus_floor: f64,
    pub speed_bonus_cap: u64,
    pub streak_bonus: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base_gems: 10,
            speed_bonus_floor: 6.0,
            speed_bonus_cap: 4,
            streak_bonus: 5,
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub filter: FilterConfig,
    pub route: RouteConfig,
    pub metrics: MetricsConfig,
    pub rewards: RewardConfig,
    pub unit: DistanceUnit,
    /// Live snapshot period
    pub tick_interval_ms: u64,
    /// User's calendar offset from UTC, for daily resets and streaks
    pub utc_offset_minutes: i32,
    pub daily_minutes_goal: u32,
    pub edit_history_capacity: usize,
    pub recent_sessions_limit: usize,
    /// Keep the route polyline on persisted sessions
    pub retain_routes: bool,
    /// Give back an item's gem cost when its placement is undone
    pub refund_on_undo: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            route: RouteConfig::default(),
            metrics: MetricsConfig::default(),
            rewards: RewardConfig::default(),
            unit: DistanceUnit::Miles,
            tick_interval_ms: 1000,
            utc_offset_minutes: 0,
            daily_minutes_goal: 30,
            edit_history_capacity: 20,
            recent_sessions_limit: 50,
            retain_routes: true,
            refund_on_undo: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults; malformed ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();
        let config = Self {
            filter: FilterConfig {
                min_interval_secs: parse_var(
                    "TRACKER_FILTER_MIN_INTERVAL_SECS",
                    defaults.filter.min_interval_secs,
                )?,
                min_distance_meters: parse_var(
                    "TRACKER_FILTER_MIN_DISTANCE_METERS",
                    defaults.filter.min_distance_meters,
                )?,
                min_speed_mps: parse_var(
                    "TRACKER_FILTER_MIN_SPEED_MPS",
                    defaults.filter.min_speed_mps,
                )?,
                max_speed_mps: parse_var(
                    "TRACKER_FILTER_MAX_SPEED_MPS",
                    defaults.filter.max_speed_mps,
                )?,
                max_distance_ratio: parse_var(
                    "TRACKER_FILTER_MAX_DISTANCE_RATIO",
                    defaults.filter.max_distance_ratio,
                )?,
            },
            route: RouteConfig {
                min_distance_meters: parse_var(
                    "TRACKER_ROUTE_MIN_DISTANCE_METERS",
                    defaults.route.min_distance_meters,
                )?,
                min_interval_secs: parse_var(
                    "TRACKER_ROUTE_MIN_INTERVAL_SECS",
                    defaults.route.min_interval_secs,
                )?,
            },
            metrics: MetricsConfig {
                speed_window: parse_var(
                    "TRACKER_SPEED_WINDOW",
                    defaults.metrics.speed_window,
                )?,
                pace_speed_floor: parse_var(
                    "TRACKER_PACE_SPEED_FLOOR",
                    defaults.metrics.pace_speed_floor,
                )?,
            },
            rewards: RewardConfig {
                base_gems: parse_var("TRACKER_BASE_GEMS", defaults.rewards.base_gems)?,
                speed_bonus_floor: parse_var(
                    "TRACKER_SPEED_BONUS_FLOOR",
                    defaults.rewards.speed_bonus_floor,
                )?,
                speed_bonus_cap: parse_var(
                    "TRACKER_SPEED_BONUS_CAP",
                    defaults.rewards.speed_bonus_cap,
                )?,
                streak_bonus: parse_var("TRACKER_STREAK_BONUS", defaults.rewards.streak_bonus)?,
            },
            unit: match env::var("TRACKER_UNIT") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|_| ConfigError::Invalid("TRACKER_UNIT", raw))?,
                Err(_) => defaults.unit,
            },
            tick_interval_ms: parse_var("TRACKER_TICK_INTERVAL_MS", defaults.tick_interval_ms)?,
            utc_offset_minutes: parse_var(
                "TRACKER_UTC_OFFSET_MINUTES",
                defaults.utc_offset_minutes,
            )?,
            daily_minutes_goal: parse_var(
                "TRACKER_DAILY_MINUTES_GOAL",
                defaults.daily_minutes_goal,
            )?,
            edit_history_capacity: parse_var(
                "TRACKER_EDIT_HISTORY_CAPACITY",
                defaults.edit_history_capacity,
            )?,
            recent_sessions_limit: parse_var(
                "TRACKER_RECENT_SESSIONS_LIMIT",
                defaults.recent_sessions_limit,
            )?,
            retain_routes: parse_var("TRACKER_RETAIN_ROUTES", defaults.retain_routes)?,
            refund_on_undo: parse_var("TRACKER_REFUND_ON_UNDO", defaults.refund_on_undo)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject tunables that cannot work together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.filter;
        if f.min_speed_mps < 0.0 || f.min_speed_mps > f.max_speed_mps {
            return Err(ConfigError::Inconsistent(format!(
                "speed range [{}, {}] is empty",
                f.min_speed_mps, f.max_speed_mps
            )));
        }
        if f.max_distance_ratio <= 1.0 {
            return Err(ConfigError::Inconsistent(format!(
                "max_distance_ratio {} must exceed 1.0",
                f.max_distance_ratio
            )));
        }
        if self.route.min_distance_meters < f.min_distance_meters
            || self.route.min_interval_secs < f.min_interval_secs
        {
            return Err(ConfigError::Inconsistent(
                "route thresholds must be at least as coarse as the fix filter".to_string(),
            ));
        }
        if self.metrics.speed_window == 0 || self.edit_history_capacity == 0 {
            return Err(ConfigError::Inconsistent(
                "speed_window and edit_history_capacity must be non-zero".to_string(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Inconsistent(
                "tick_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Daily goal in seconds.
    pub fn daily_goal_secs(&self) -> f64 {
        f64::from(self.daily_minutes_goal) * 60.0
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),

    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}
