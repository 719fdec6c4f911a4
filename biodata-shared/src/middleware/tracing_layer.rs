use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset: the service crate at debug, the rest at info.
pub fn default_filter(service_name: &str) -> String {
    let crate_target = service_name.replace('-', "_");
    format!("info,{crate_target}=debug,tower_http=debug")
}

/// Installs the global subscriber. `BIODATA_ENV=production` switches to JSON lines.
pub fn init_tracing(service_name: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(service_name)));

    let json = std::env::var("BIODATA_ENV").is_ok_and(|v| v == "production");

    let output = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(output).init();

    tracing::info!(service = service_name, json, "tracing initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_targets_the_crate_name() {
        assert_eq!(default_filter("biodata-api"), "info,biodata_api=debug,tower_http=debug");
    }
}
