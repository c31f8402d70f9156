//! Logging and event bus demonstration
//!
//! Run with:
//! ```bash
//! cargo run -p core-runtime --example logging_demo
//! cargo run -p core-runtime --example logging_demo -- json
//! cargo run -p core-runtime --example logging_demo -- compact "core_runtime=trace"
//! ```

use bridge_traits::time::{ConsoleLogger, LogLevel};
use core_runtime::events::{EventBus, PlaybackEvent};
use core_runtime::logging::{init_logging, redact_source, LogFormat, LoggingConfig};
use std::env;
use std::sync::Arc;
use tracing::{debug, info, info_span, trace, warn};

fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_logger_sink(Arc::new(ConsoleLogger {
            min_level: LogLevel::Warn,
        }));

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    if let Err(e) = init_logging(config) {
        eprintln!("{}", e);
        return;
    }

    let bus = EventBus::default();
    let mut stream = bus.stream();

    let src = "https://cdn.example.com/episode-12.mp3?token=abc123";
    let _span = info_span!("session", src = %redact_source(src)).entered();

    info!("Source selected");
    for second in 0..3 {
        trace!(position = second, "Time update");
        bus.emit(PlaybackEvent::PositionChanged {
            position_secs: second as f64,
        })
        .ok();
    }
    warn!("Playback stalled");

    while let Some(Ok(event)) = stream.try_recv() {
        debug!(event = event.description(), severity = ?event.severity(), "Observed");
    }
}
