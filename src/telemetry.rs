use tracing_subscriber::EnvFilter;

/// Install a `tracing` fmt subscriber for binaries embedding the engine.
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at `debug` when
/// `debug` is set and at `info` when it is not. Calling this more than once is
/// harmless.
pub fn init_tracing(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .try_init();
}

fn env_filter(debug: bool) -> EnvFilter {
    let level = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("locale_sync={}", level)))
}
