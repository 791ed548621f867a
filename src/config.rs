use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parámetros del núcleo de sync offline.
///
/// Los campos en milisegundos mantienen la config serializable como números;
/// en el código usar los accesores `Duration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub api_base_url: String,
    pub probe_url: String,
    pub request_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    pub probe_interval_ms: u64,
    pub settle_delay_ms: u64,
    pub throttle_ms: u64,
    pub retry_attempts: u32,
    pub storage_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: "/api".to_string(),
            probe_url: "/api/health".to_string(),
            request_timeout_ms: 12_000,
            probe_timeout_ms: 5_000,
            probe_interval_ms: 30_000,
            settle_delay_ms: 2_000,
            throttle_ms: 300,
            retry_attempts: 2,
            storage_prefix: "stock_".to_string(),
        }
    }
}

impl SyncConfig {
    /// Construye la config desde variables de entorno de compilación (ver build.rs)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_base_url: option_env!("API_BASE_URL")
                .map(str::to_string)
                .unwrap_or(defaults.api_base_url),
            probe_url: option_env!("PROBE_URL")
                .map(str::to_string)
                .unwrap_or(defaults.probe_url),
            request_timeout_ms: option_env!("REQUEST_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_ms),
            probe_timeout_ms: option_env!("PROBE_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.probe_timeout_ms),
            probe_interval_ms: option_env!("PROBE_INTERVAL_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.probe_interval_ms),
            settle_delay_ms: option_env!("SETTLE_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.settle_delay_ms),
            throttle_ms: option_env!("SYNC_THROTTLE_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.throttle_ms),
            retry_attempts: option_env!("SYNC_RETRY_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retry_attempts),
            storage_prefix: option_env!("STORAGE_PREFIX")
                .map(str::to_string)
                .unwrap_or(defaults.storage_prefix),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// Intentos por acción en una pasada; nunca menos de uno
    pub fn attempts_per_action(&self) -> u32 {
        self.retry_attempts.max(1)
    }

    /// Clave de storage para `name` bajo el prefijo configurado
    pub fn storage_key(&self, name: &str) -> String {
        format!("{}{}", self.storage_prefix, name)
    }
}

// Config global resuelta una vez por proceso
lazy_static::lazy_static! {
    pub static ref CONFIG: SyncConfig = SyncConfig::from_env();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SyncConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(12));
        assert_eq!(config.probe_interval(), Duration::from_secs(30));
        assert_eq!(config.throttle(), Duration::from_millis(300));
        assert_eq!(config.storage_key("pending_actions"), "stock_pending_actions");
    }

    #[test]
    fn zero_retry_attempts_still_tries_once() {
        let config = SyncConfig {
            retry_attempts: 0,
            ..SyncConfig::default()
        };
        assert_eq!(config.attempts_per_action(), 1);
    }
}
