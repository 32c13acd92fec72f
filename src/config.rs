//! Store configuration.
//!
//! The configuration block is deserialized from the bridge's config file by
//! the process-level config loader; this module only defines its shape and
//! validates it. Duration limits use Go-style duration strings (`"90s"`,
//! `"1h30m"`, `"500ms"`) since that is what bridge deployments already carry
//! in their config files.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fallback when `max_open_conns` is 0 or absent (0 has no "unlimited"
/// meaning for the pool, so it falls back to the default cap).
pub const DEFAULT_MAX_OPEN_CONNS: u32 = 10;
/// Fallback when `max_idle_conns` is 0 or absent.
pub const DEFAULT_MAX_IDLE_CONNS: u32 = 1;

/// Database section of the bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Engine identifier: "sqlite" / "sqlite3" or "postgres" / "postgresql".
    #[serde(rename = "type")]
    pub db_type: String,
    /// Connection URI. Contains credentials for postgres - never log.
    #[serde(skip_serializing)]
    pub uri: String,
    /// Caps concurrent live connections. 0 means default.
    #[serde(default)]
    pub max_open_conns: u32,
    /// Caps warm idle connections retained by the pool. 0 means default.
    #[serde(default)]
    pub max_idle_conns: u32,
    /// Recycle a connection after this long idle. Absent means no limit.
    #[serde(default)]
    pub conn_max_idle_time: Option<String>,
    /// Recycle any connection after this long, in use or not. Absent means
    /// no limit.
    #[serde(default)]
    pub conn_max_lifetime: Option<String>,
}

impl StoreConfig {
    pub fn max_open_conns_or_default(&self) -> u32 {
        if self.max_open_conns == 0 {
            DEFAULT_MAX_OPEN_CONNS
        } else {
            self.max_open_conns
        }
    }

    pub fn max_idle_conns_or_default(&self) -> u32 {
        if self.max_idle_conns == 0 {
            DEFAULT_MAX_IDLE_CONNS
        } else {
            self.max_idle_conns
        }
    }

    /// Parsed `conn_max_idle_time`, or a fatal config error for a bad string.
    pub fn conn_max_idle_time(&self) -> StoreResult<Option<Duration>> {
        parse_optional_duration(self.conn_max_idle_time.as_deref(), "conn_max_idle_time")
    }

    /// Parsed `conn_max_lifetime`, or a fatal config error for a bad string.
    pub fn conn_max_lifetime(&self) -> StoreResult<Option<Duration>> {
        parse_optional_duration(self.conn_max_lifetime.as_deref(), "conn_max_lifetime")
    }
}

fn parse_optional_duration(value: Option<&str>, field: &str) -> StoreResult<Option<Duration>> {
    match value {
        None | Some("") => Ok(None),
        Some(s) => parse_duration(s)
            .map(Some)
            .map_err(|e| StoreError::config(format!("failed to parse {field}: {e}"))),
    }
}

/// Parse a Go-style duration string: a sequence of decimal numbers (with an
/// optional fraction) each followed by a unit suffix, e.g. "300ms", "2h45m".
/// Valid units are "ns", "us"/"µs", "ms", "s", "m", "h". The bare string "0"
/// is allowed without a unit.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err("empty duration string".to_string());
    }

    let mut total_ns: u128 = 0;
    let mut rest = input;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(digits_end);
        if number.is_empty() {
            return Err(format!("invalid duration {input:?}"));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid duration {input:?}"))?;

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);
        let unit_ns: u64 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            "" => return Err(format!("missing unit in duration {input:?}")),
            _ => return Err(format!("unknown unit {unit:?} in duration {input:?}")),
        };

        total_ns += (value * unit_ns as f64) as u128;
        rest = next;
    }

    Ok(Duration::from_nanos(
        u64::try_from(total_ns).map_err(|_| format!("duration {input:?} overflows"))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_durations() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("300ms").unwrap(), Duration::from_millis(300));
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_compound_and_fractional_durations() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("2m30s").unwrap(), Duration::from_secs(150));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("1").is_err());
        assert!(parse_duration("ten minutes").is_err());
        assert!(parse_duration("5x").is_err());
        assert!(parse_duration("s5").is_err());
    }

    #[test]
    fn test_conn_limit_defaults() {
        let config = StoreConfig {
            db_type: "sqlite".to_string(),
            uri: "sqlite::memory:".to_string(),
            max_open_conns: 0,
            max_idle_conns: 0,
            conn_max_idle_time: None,
            conn_max_lifetime: None,
        };
        assert_eq!(config.max_open_conns_or_default(), DEFAULT_MAX_OPEN_CONNS);
        assert_eq!(config.max_idle_conns_or_default(), DEFAULT_MAX_IDLE_CONNS);
    }

    #[test]
    fn test_bad_duration_is_config_error() {
        let config = StoreConfig {
            db_type: "postgres".to_string(),
            uri: "postgres://localhost/bridge".to_string(),
            max_open_conns: 20,
            max_idle_conns: 2,
            conn_max_idle_time: Some("soon".to_string()),
            conn_max_lifetime: None,
        };
        let err = config.conn_max_idle_time().unwrap_err();
        assert!(matches!(err, StoreError::Config { .. }));
        assert!(err.to_string().contains("conn_max_idle_time"));
    }

    #[test]
    fn test_deserialize_from_config_file_shape() {
        let raw = r#"{
            "type": "postgres",
            "uri": "postgres://bridge:secret@db/bridge",
            "max_open_conns": 20,
            "max_idle_conns": 2,
            "conn_max_idle_time": "30m"
        }"#;
        let config: StoreConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.db_type, "postgres");
        assert_eq!(
            config.conn_max_idle_time().unwrap(),
            Some(Duration::from_secs(1800))
        );
        assert_eq!(config.conn_max_lifetime().unwrap(), None);
    }
}
