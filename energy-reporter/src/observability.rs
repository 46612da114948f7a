use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Crates whose `info` events are shown unless `RUST_LOG` says otherwise.
const DEFAULT_DIRECTIVES: &[&str] = &["energy_reporter=info", "telemetry_client=info"];

pub fn init_tracing() {
    let filter = DEFAULT_DIRECTIVES.iter().fold(
        EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy(),
        |filter, directive| match directive.parse() {
            Ok(d) => filter.add_directive(d),
            Err(_) => filter,
        },
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
