use tracing::Level;
use std::sync::Once;
use std::collections::VecDeque;

static INIT: Once = Once::new();

/// Logger that prepends a chain of prefixes such as `[research]` to every line.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: VecDeque<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            prefixes: VecDeque::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push_back(prefix.into());
        self
    }

    fn prefix(&self) -> String {
        self.prefixes.iter().map(|p| format!("{} ", p)).collect::<String>()
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}{}", self.prefix(), message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}{}", self.prefix(), message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}{}", self.prefix(), message);
    }
}

pub fn parse_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global fmt subscriber once; later calls are no-ops.
pub fn init_logging(level: &str) -> Logger {
    if !tracing::dispatcher::has_been_set() {
        let level = parse_level(level);
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(false)
                .init();
        });
    }
    Logger::new()
}
