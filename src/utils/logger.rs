use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins; otherwise our crate at `level` plus request spans from tower-http.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("glow_atelier={level},tower_http={level},warn"))
    })
}

/// Human-readable output for local runs and the feed generator.
pub fn init_cli_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .compact(),
        )
        .init();
}

/// One JSON object per line, for hosted deployments that ship stdout to a collector.
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .json() // 容器環境使用 JSON 格式方便收集
                .with_current_span(false),
        )
        .init();
}
