use std::env;
use std::fs;
use std::path::Path;

/// Valores que lee `SyncConfig::from_env` con `option_env!`.
const SYNC_KEYS: &[&str] = &[
    "API_BASE_URL",
    "PROBE_URL",
    "REQUEST_TIMEOUT_MS",
    "PROBE_TIMEOUT_MS",
    "PROBE_INTERVAL_MS",
    "SETTLE_DELAY_MS",
    "SYNC_THROTTLE_MS",
    "SYNC_RETRY_ATTEMPTS",
    "STORAGE_PREFIX",
];

fn main() {
    // Cargar configuración de sync desde .env si existe
    let env_file = Path::new(".env");

    if env_file.exists() {
        println!("cargo:rerun-if-changed=.env");

        if let Ok(contents) = fs::read_to_string(env_file) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                // KEY=VALUE
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"');

                    if !SYNC_KEYS.contains(&key) {
                        println!("cargo:warning=Ignorando clave desconocida en .env: {}", key);
                        continue;
                    }

                    // El entorno real tiene prioridad sobre .env
                    if env::var(key).is_err() {
                        println!("cargo:rustc-env={}={}", key, value);
                    }
                }
            }
        }
    }

    for key in SYNC_KEYS {
        println!("cargo:rerun-if-env-changed={}", key);
    }
    println!("cargo:rerun-if-changed=build.rs");
}
