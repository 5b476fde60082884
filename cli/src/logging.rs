use std::sync::Once;

use env_logger::WriteStyle;

/// Logger configuration.
///
/// `filter` follows the `env_logger` filter syntax (e.g. "debug",
/// "funcmark=trace"). When absent, `RUST_LOG` is consulted, then `warn`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub write_style: WriteStyle,
}

impl LoggingConfig {
    pub fn new(filter: Option<String>, no_color: bool) -> Self {
        LoggingConfig {
            filter,
            write_style: if no_color {
                WriteStyle::Never
            } else {
                WriteStyle::Auto
            },
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => builder.parse_filters(&filter),
            None => builder.filter_level(log::LevelFilter::Warn),
        };

        builder.write_style(config.write_style);
        builder.init();

        log::debug!("logging initialized");
    });
}
