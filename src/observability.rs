//! Observability utilities.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::types::ObservabilityConfig;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Initialize tracing subscriber once for the process.
///
/// The config supplies the defaults: `log_level` is the filter when
/// `RUST_LOG` is unset, and `json_logs` picks the format unless
/// `TOOLCAST_LOG_FORMAT` overrides it (`json` or `text`).
pub fn init_tracing(config: &ObservabilityConfig) {
    TRACING_INIT.get_or_init(|| {
        let env_filter = env_filter(config);
        let format = std::env::var("TOOLCAST_LOG_FORMAT").ok();
        let result = if use_json(config, format.as_deref()) {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact())
                .try_init()
        };

        if let Err(err) = result {
            eprintln!("tracing init skipped: {err}");
        }
    });
}

fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()))
}

/// `TOOLCAST_LOG_FORMAT` wins when set; the config decides otherwise.
fn use_json(config: &ObservabilityConfig, env_format: Option<&str>) -> bool {
    match env_format {
        Some(v) => v.eq_ignore_ascii_case("json"),
        None => config.json_logs,
    }
}
