//! Runtime configuration.
//!
//! Every setting has a default and can be overridden through a `DINEIN_*` environment
//! variable. A variable that is set but cannot be parsed is an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is not valid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Mailbox size of every actor.
    pub actor_buffer: usize,
    /// Transition events kept for slow subscribers before they start lagging.
    pub bus_capacity: usize,
    pub session_idle_timeout: Duration,
    /// Zero disables the background reaper.
    pub reaper_interval: Duration,
    /// How long before a reservation starts its table is held.
    pub reservation_lead_time: Duration,
    pub default_reservation_minutes: u32,
    pub tax_rate: Decimal,
    pub service_rate: Decimal,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            actor_buffer: 64,
            bus_capacity: 1024,
            session_idle_timeout: Duration::from_secs(30 * 60),
            reaper_interval: Duration::from_secs(30),
            reservation_lead_time: Duration::from_secs(30 * 60),
            default_reservation_minutes: 120,
            tax_rate: Decimal::ZERO,
            service_rate: Decimal::ZERO,
        }
    }
}

fn parse<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value,
    })
}

impl SystemConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let secs = |var: &'static str, scale: u64| -> Result<Option<Duration>, ConfigError> {
            let Some(value) = lookup(var) else {
                return Ok(None);
            };
            let n = parse::<u64>(var, value.clone())?;
            n.checked_mul(scale)
                .map(|secs| Some(Duration::from_secs(secs)))
                .ok_or(ConfigError::Invalid {
                    var,
                    value,
                    reason: "duration is too large".into(),
                })
        };

        if let Some(value) = lookup("DINEIN_ACTOR_BUFFER") {
            config.actor_buffer = parse("DINEIN_ACTOR_BUFFER", value)?;
        }
        if let Some(value) = lookup("DINEIN_BUS_CAPACITY") {
            config.bus_capacity = parse("DINEIN_BUS_CAPACITY", value)?;
        }
        if let Some(timeout) = secs("DINEIN_SESSION_IDLE_SECS", 1)? {
            config.session_idle_timeout = timeout;
        }
        if let Some(interval) = secs("DINEIN_REAPER_INTERVAL_SECS", 1)? {
            config.reaper_interval = interval;
        }
        if let Some(lead) = secs("DINEIN_RESERVATION_LEAD_MINS", 60)? {
            config.reservation_lead_time = lead;
        }
        if let Some(value) = lookup("DINEIN_RESERVATION_MINUTES") {
            config.default_reservation_minutes = parse("DINEIN_RESERVATION_MINUTES", value)?;
        }
        if let Some(value) = lookup("DINEIN_TAX_RATE") {
            config.tax_rate = parse("DINEIN_TAX_RATE", value)?;
        }
        if let Some(value) = lookup("DINEIN_SERVICE_RATE") {
            config.service_rate = parse("DINEIN_SERVICE_RATE", value)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session_idle_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "DINEIN_SESSION_IDLE_SECS",
                value: "0".into(),
                reason: "idle timeout must be positive".into(),
            });
        }
        if self.default_reservation_minutes == 0 {
            return Err(ConfigError::Invalid {
                var: "DINEIN_RESERVATION_MINUTES",
                value: "0".into(),
                reason: "reservations need a duration".into(),
            });
        }
        for (var, rate) in [("DINEIN_TAX_RATE", self.tax_rate), ("DINEIN_SERVICE_RATE", self.service_rate)] {
            if rate.is_sign_negative() {
                return Err(ConfigError::Invalid {
                    var,
                    value: rate.to_string(),
                    reason: "rates cannot be negative".into(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(SystemConfig::from_lookup(lookup(&[])).unwrap(), SystemConfig::default());
    }

    #[test]
    fn overrides_are_applied_with_units() {
        let config = SystemConfig::from_lookup(lookup(&[
            ("DINEIN_SESSION_IDLE_SECS", "90"),
            ("DINEIN_RESERVATION_LEAD_MINS", "15"),
            ("DINEIN_TAX_RATE", "0.05"),
            ("DINEIN_REAPER_INTERVAL_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.session_idle_timeout, Duration::from_secs(90));
        assert_eq!(config.reservation_lead_time, Duration::from_secs(15 * 60));
        assert_eq!(config.tax_rate, Decimal::new(5, 2));
        assert!(config.reaper_interval.is_zero());
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = SystemConfig::from_lookup(lookup(&[("DINEIN_ACTOR_BUFFER", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "DINEIN_ACTOR_BUFFER", .. }));

        let err = SystemConfig::from_lookup(lookup(&[("DINEIN_SERVICE_RATE", "-0.1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "DINEIN_SERVICE_RATE", .. }));
    }

    #[test]
    fn oversized_durations_are_errors() {
        let huge = u64::MAX.to_string();
        let err = SystemConfig::from_lookup(lookup(&[("DINEIN_RESERVATION_LEAD_MINS", huge.as_str())])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "DINEIN_RESERVATION_LEAD_MINS",
                value: huge.clone(),
                reason: "duration is too large".into(),
            }
        );
    }
}
