//! Diagnostic tracing for debugging the hook.
//!
//! Stderr is also the channel the host reads the rejection report from, so
//! tracing stays silent unless explicitly enabled:
//!
//! ```bash
//! CONSTITUTION_ENFORCER_LOG=debug constitution-enforcer < payload.json
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_ENV: &str = "CONSTITUTION_ENFORCER_LOG";

/// Install the stderr subscriber. Defaults to `off` when `LOG_ENV` is unset or invalid.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .compact(),
        )
        .try_init();
}
