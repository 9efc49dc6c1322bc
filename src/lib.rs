pub mod commands;
pub mod core;
pub mod document;
pub mod parser;
pub mod render;

use tracing_subscriber::EnvFilter;

fn log_level_from_env() -> &'static str {
    match std::env::var("PLEADINGS_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .to_ascii_lowercase()
        .as_str()
    {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `PLEADINGS_LOG` when set.
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pleadings_lib={0},pleadings={0}", log_level_from_env())));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
