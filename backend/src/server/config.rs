//! Server settings and the assembled server configuration.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;

use guardpost_backend::domain::{
    AttendancePolicy, BreachAlertMode, DEFAULT_THRESHOLD_MINUTES, ParseBreachAlertModeError,
};
use guardpost_backend::outbound::persistence::DbPool;
use guardpost_backend::outbound::realtime::DEFAULT_HUB_CAPACITY;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Invalid server settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address {value}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    /// `breach_alert_mode` is not a known mode.
    #[error(transparent)]
    BreachAlertMode(#[from] ParseBreachAlertModeError),
    /// A threshold is negative.
    #[error("{field} must not be negative, got {value}")]
    NegativeThreshold { field: &'static str, value: i64 },
}

/// Field operations settings loaded via OrthoConfig.
///
/// Every value can come from a `GUARDPOST_*` environment variable, a config
/// file or the command line. Unset values fall back to the defaults below.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GUARDPOST")]
pub struct GuardpostSettings {
    /// PostgreSQL URL. Without one the server runs on fixture ports.
    pub database_url: Option<String>,
    /// Listen address, default `0.0.0.0:8080`.
    pub bind_addr: Option<String>,
    /// Minutes late beyond which a late arrival alert is raised.
    #[ortho_config(default = DEFAULT_THRESHOLD_MINUTES)]
    pub late_threshold_minutes: i64,
    /// Minutes early beyond which an early departure alert is raised.
    #[ortho_config(default = DEFAULT_THRESHOLD_MINUTES)]
    pub early_departure_threshold_minutes: i64,
    /// `episode` or `per_report`.
    pub breach_alert_mode: Option<String>,
    /// Events buffered per WebSocket subscriber before it lags.
    pub alert_hub_capacity: Option<usize>,
}

impl GuardpostSettings {
    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// [`SettingsError::BindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Attendance alert thresholds.
    ///
    /// # Errors
    ///
    /// [`SettingsError::NegativeThreshold`] for a negative threshold.
    pub fn attendance_policy(&self) -> Result<AttendancePolicy, SettingsError> {
        let threshold = |field: &'static str, minutes: i64| {
            if minutes < 0 {
                Err(SettingsError::NegativeThreshold {
                    field,
                    value: minutes,
                })
            } else {
                Ok(minutes)
            }
        };
        Ok(AttendancePolicy {
            late_threshold_minutes: threshold(
                "late_threshold_minutes",
                self.late_threshold_minutes,
            )?,
            early_departure_threshold_minutes: threshold(
                "early_departure_threshold_minutes",
                self.early_departure_threshold_minutes,
            )?,
        })
    }

    /// Breach alerting mode, default [`BreachAlertMode::Episode`].
    ///
    /// # Errors
    ///
    /// [`SettingsError::BreachAlertMode`] for an unknown mode.
    pub fn breach_alert_mode(&self) -> Result<BreachAlertMode, SettingsError> {
        Ok(self
            .breach_alert_mode
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or(BreachAlertMode::Episode))
    }

    /// Hub buffer size per subscriber.
    pub fn alert_hub_capacity(&self) -> usize {
        self.alert_hub_capacity.unwrap_or(DEFAULT_HUB_CAPACITY)
    }
}

/// Everything the HTTP server needs, assembled in `main`.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) policy: AttendancePolicy,
    pub(crate) breach_mode: BreachAlertMode,
    pub(crate) hub_capacity: usize,
}

impl ServerConfig {
    /// Session and binding settings with default field operations policy.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool: None,
            policy: AttendancePolicy::default(),
            breach_mode: BreachAlertMode::Episode,
            hub_capacity: DEFAULT_HUB_CAPACITY,
        }
    }

    /// Use Diesel repositories over `pool` instead of fixtures.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Attendance thresholds, breach mode and hub sizing.
    #[must_use]
    pub fn with_field_ops(
        mut self,
        policy: AttendancePolicy,
        breach_mode: BreachAlertMode,
        hub_capacity: usize,
    ) -> Self {
        self.policy = policy;
        self.breach_mode = breach_mode;
        self.hub_capacity = hub_capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    //! Settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "GUARDPOST_DATABASE_URL",
        "GUARDPOST_BIND_ADDR",
        "GUARDPOST_LATE_THRESHOLD_MINUTES",
        "GUARDPOST_EARLY_DEPARTURE_THRESHOLD_MINUTES",
        "GUARDPOST_BREACH_ALERT_MODE",
        "GUARDPOST_ALERT_HUB_CAPACITY",
    ];

    fn load_with(overrides: &[(&str, &str)]) -> GuardpostSettings {
        let _guard = lock_env(VARS.map(|name| {
            let value = overrides
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned());
            (name, value)
        }));
        GuardpostSettings::load_from_iter([OsString::from("guardpost-backend")])
            .expect("settings should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let settings = load_with(&[]);
        assert!(settings.database_url.is_none());
        assert_eq!(
            settings.bind_addr().expect("default parses"),
            DEFAULT_BIND_ADDR.parse::<SocketAddr>().expect("valid literal")
        );
        assert_eq!(
            settings.attendance_policy().expect("default policy"),
            AttendancePolicy::default()
        );
        assert_eq!(
            settings.breach_alert_mode().expect("default mode"),
            BreachAlertMode::Episode
        );
        assert_eq!(settings.alert_hub_capacity(), DEFAULT_HUB_CAPACITY);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let settings = load_with(&[
            ("GUARDPOST_DATABASE_URL", "postgres://db/guardpost"),
            ("GUARDPOST_BIND_ADDR", "127.0.0.1:9000"),
            ("GUARDPOST_LATE_THRESHOLD_MINUTES", "5"),
            ("GUARDPOST_EARLY_DEPARTURE_THRESHOLD_MINUTES", "30"),
            ("GUARDPOST_BREACH_ALERT_MODE", "per_report"),
            ("GUARDPOST_ALERT_HUB_CAPACITY", "64"),
        ]);
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://db/guardpost")
        );
        assert_eq!(
            settings.bind_addr().expect("override parses").port(),
            9000
        );
        let policy = settings.attendance_policy().expect("override policy");
        assert_eq!(policy.late_threshold_minutes, 5);
        assert_eq!(policy.early_departure_threshold_minutes, 30);
        assert_eq!(
            settings.breach_alert_mode().expect("override mode"),
            BreachAlertMode::PerReport
        );
        assert_eq!(settings.alert_hub_capacity(), 64);
    }

    #[rstest]
    fn unknown_breach_mode_is_rejected() {
        let settings = load_with(&[("GUARDPOST_BREACH_ALERT_MODE", "sometimes")]);
        assert!(matches!(
            settings.breach_alert_mode(),
            Err(SettingsError::BreachAlertMode(_))
        ));
    }

    #[rstest]
    fn negative_threshold_is_rejected() {
        let settings = load_with(&[("GUARDPOST_LATE_THRESHOLD_MINUTES", "-1")]);
        assert!(matches!(
            settings.attendance_policy(),
            Err(SettingsError::NegativeThreshold {
                field: "late_threshold_minutes",
                value: -1
            })
        ));
    }

    #[rstest]
    fn malformed_bind_addr_is_rejected() {
        let settings = load_with(&[("GUARDPOST_BIND_ADDR", "not-an-address")]);
        assert!(matches!(
            settings.bind_addr(),
            Err(SettingsError::BindAddr { .. })
        ));
    }
}
