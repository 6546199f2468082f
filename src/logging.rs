use env_logger::Builder;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fmt;
use std::io::{self, Write};
use std::panic::Location;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

pub const DEFAULT_TARGET: &str = "spadev";

/// Builds the `env_logger` sink used by both binaries without installing
/// it as the process-wide logger.
pub fn env_sink() -> env_logger::Logger {
    Builder::new()
        .filter_level(LevelFilter::Info) // Set default level
        .parse_env("RUST_LOG") // Allow override through env var
        .format(format_record)
        .build()
}

fn format_record(buf: &mut env_logger::fmt::Formatter, record: &Record) -> io::Result<()> {
    let timestamp = humantime::format_rfc3339_millis(SystemTime::now());
    let level = record.level();

    if atty::is(atty::Stream::Stderr) {
        let level_color = match level {
            Level::Error => "\x1B[31m", // Red
            Level::Warn => "\x1B[33m",  // Yellow
            Level::Info => "\x1B[32m",  // Green
            Level::Debug => "\x1B[36m", // Cyan
            Level::Trace => "\x1B[35m", // Magenta
        };
        write!(buf, "{}{:>5}\x1B[0m [{}] {}", level_color, level, timestamp, record.args())?;
    } else {
        write!(buf, "{:>5} [{}] {}", level, timestamp, record.args())?;
    }

    // Only include file and line for debug/trace levels
    if level >= Level::Debug {
        write!(
            buf,
            " - {}:{}",
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0)
        )?;
    }
    writeln!(buf)
}

/// Logger handle passed explicitly to the server and the compression pass.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Log>,
    target: &'static str,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("target", &self.target).finish()
    }
}

impl Logger {
    pub fn new(sink: Arc<dyn Log>) -> Self {
        Self {
            sink,
            target: DEFAULT_TARGET,
        }
    }

    /// Logger configured from `RUST_LOG`, defaulting to `info`.
    pub fn from_env() -> Self {
        Self::new(Arc::new(env_sink()))
    }

    pub fn discard() -> Self {
        Self::new(Arc::new(Discard))
    }

    /// Same sink, different record target.
    pub fn scoped(&self, target: &'static str) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            target,
        }
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.sink
            .enabled(&Metadata::builder().level(level).target(self.target).build())
    }

    #[track_caller]
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let caller = Location::caller();
        self.sink.log(
            &Record::builder()
                .args(args)
                .level(level)
                .target(self.target)
                .file(Some(caller.file()))
                .line(Some(caller.line()))
                .build(),
        );
    }

    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args)
    }

    #[track_caller]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args)
    }

    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args)
    }

    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args)
    }

    /// Runs `f`, logging start and completion at debug and failure at error.
    #[track_caller]
    pub fn log_operation<F, T, E>(&self, operation: &str, subject: &dyn fmt::Display, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        self.debug(format_args!("Starting {} on {}", operation, subject));
        match f() {
            Ok(result) => {
                self.debug(format_args!("Completed {} on {}", operation, subject));
                Ok(result)
            }
            Err(e) => {
                self.error(format_args!("Failed {} on {}: {}", operation, subject, e));
                Err(e)
            }
        }
    }
}

struct Discard;

impl Log for Discard {
    fn enabled(&self, _: &Metadata) -> bool {
        false
    }

    fn log(&self, _: &Record) {}

    fn flush(&self) {}
}

/// In-memory sink that keeps every record at or above `level`.
#[derive(Debug)]
pub struct MemoryLog {
    level: LevelFilter,
    records: Mutex<Vec<(Level, String)>>,
}

impl MemoryLog {
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Messages containing `needle`, in logging order.
    pub fn matching(&self, needle: &str) -> Vec<String> {
        self.records()
            .into_iter()
            .map(|(_, message)| message)
            .filter(|message| message.contains(needle))
            .collect()
    }
}

impl Log for MemoryLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}
