use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr subscriber. `RUST_LOG` wins over `-v` flags.
pub fn init(verbose: u8) {
    let default = match verbose {
        0 => "error",
        1 => "owcast_core=info,owcast=info",
        _ => "owcast_core=debug,owcast=debug",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());

    // Fails only if a global subscriber is already set; logging must not abort the command.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
