//! Logging setup and the host log sink.
//!
//! Every message is emitted through `tracing`. Besides the console output,
//! the host can receive each event as a single `[HH:MM:SS] message` line via a
//! [`LogSink`]; where those lines end up is the host's decision.

use std::fmt::{self, Write as _};
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use chrono::{Local, NaiveTime};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{FmtSubscriber, Layer};

/// Line-oriented text sink supplied by the host
pub trait LogSink: Send + Sync + 'static {
    fn write_line(&self, line: &str);
}

/// Appends log lines to a file
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for FileSink {
    fn write_line(&self, line: &str) {
        // A poisoned lock only means another thread panicked mid-write
        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(file, "{}", line);
    }
}

/// `tracing` layer forwarding every event to a [`LogSink`]
pub struct SinkLayer<K> {
    sink: K,
}

impl<K: LogSink> SinkLayer<K> {
    pub fn new(sink: K) -> Self {
        Self { sink }
    }
}

impl<S: Subscriber, K: LogSink> Layer<S> for SinkLayer<K> {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.sink
            .write_line(&format_line(Local::now().time(), &visitor.finish()));
    }
}

/// Formats one sink line: `[HH:MM:SS] message`
pub fn format_line(time: NaiveTime, message: &str) -> String {
    format!("[{}] {}", time.format("%H:%M:%S"), message)
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Installs the global subscriber: pretty console output plus, when
/// `log_file` is set, a [`FileSink`] receiving timestamped lines.
pub fn init(level: Level, log_file: Option<&Path>) -> std::io::Result<()> {
    let sink = log_file.map(FileSink::create).transpose()?.map(SinkLayer::new);

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .finish()
        .with(sink)
        .init();
    Ok(())
}
