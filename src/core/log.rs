use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Directives used when `RUST_LOG` is unset.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "quoting=debug,warn"
    } else {
        "quoting=info,warn"
    }
}

/// `RUST_LOG` replaces the defaults entirely; `verbose` only picks the defaults.
fn build_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directives(verbose)))
}

/// Installs the global subscriber.
pub fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbose, rust_log.as_deref());

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
