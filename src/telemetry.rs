//! Tracing setup.
//!
//! - LOG_LEVEL sets the filter (default "warn,twelve_points=info").
//! - LOG_FORMAT=json switches to JSON lines.
//!
//! Logs go to stderr; stdout belongs to the game transcript.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("warn,twelve_points=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
