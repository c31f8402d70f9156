//! Integration tests for logging system

use bridge_traits::error::Result as SinkResult;
use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, redact_source, LogFormat, LoggingConfig};
use core_runtime::Error;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl LoggerSink for CollectingSink {
    fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// A global subscriber can be installed once per process, so everything that
// depends on it lives in this single test.
#[test]
fn test_init_logging_installs_sink_once() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config.clone()).expect("first initialization succeeds");

    tracing::debug!(target: "core_playback::manager", src = "ep1.mp3", "Source changed");
    tracing::trace!(target: "core_playback::manager", "Below the configured level");
    tracing::info!(target: "some_dependency", "Filtered out by the default directives");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Source changed");
        assert_eq!(entries[0].level, LogLevel::Debug);
        assert_eq!(entries[0].fields.get("src"), Some(&"ep1.mp3".to_string()));
    }

    assert!(matches!(init_logging(config), Err(Error::Config(_))));
}

#[test]
fn test_invalid_filter_is_rejected_before_install() {
    let config = LoggingConfig::default().with_filter("core_playback=noisy");
    assert!(matches!(init_logging(config), Err(Error::Config(_))));
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_spans(true)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
    assert!(format!("{:?}", config).contains("LoggingConfig"));
}

#[test]
fn test_signed_urls_are_redacted() {
    let src = "https://media.example.com/lesson-3.m4a?X-Amz-Signature=deadbeef";
    let redacted = redact_source(src);
    assert!(!redacted.contains("deadbeef"));
    assert!(redacted.starts_with("https://media.example.com/lesson-3.m4a"));
}
