use chrono::Utc;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::VecDeque;
use std::env::var;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const MAX_LOG_LINES: usize = 10000;

// Values attached to these keys are masked before a line reaches the shell,
// the dashboard displays the buffer verbatim in its console panel
const SANITIZED_KEYWORDS: [&str; 6] = [
    "password",
    "secret",
    "community",
    "token",
    "key",
    "credential",
];

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

lazy_static! {
    static ref MEMORY_LOGS: Mutex<MemoryLogBuffer> = Mutex::new(MemoryLogBuffer::new());
    // The non-blocking file writer stops flushing once its guard is dropped
    static ref FILE_GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);
}

struct MemoryLogBuffer {
    lines: VecDeque<String>,
    unread: usize,
}

impl MemoryLogBuffer {
    fn new() -> Self {
        Self {
            lines: VecDeque::new(),
            unread: 0,
        }
    }

    fn push(&mut self, line: String) {
        if self.lines.len() >= MAX_LOG_LINES {
            self.lines.pop_back();
            self.unread = self.unread.min(MAX_LOG_LINES - 1);
        }
        // Latest first, the shell renders the buffer top down
        self.lines.push_front(line);
        if self.unread < MAX_LOG_LINES {
            self.unread += 1;
        }
    }
}

pub fn sanitize_keywords(input: &str) -> String {
    let mut output = input.to_string();
    for keyword in SANITIZED_KEYWORDS.iter() {
        let re = Regex::new(&format!(
            r#"(?i)(?P<key>"?\b{}"?\s*[:=]\s*)("(?P<val1>[^"]+)"|(?P<val2>[^\s",}}]+))"#,
            regex::escape(keyword)
        ))
        .unwrap();
        output = re
            .replace_all(&output, |caps: &regex::Captures| {
                let key = &caps["key"];
                let val1 = caps.name("val1").map_or("", |m| m.as_str());
                let val2 = caps.name("val2").map_or("", |m| m.as_str());
                let val = if !val1.is_empty() { val1 } else { val2 };
                let quotes = if !val1.is_empty() { "\"" } else { "" };
                format!("{}{}{}{}", key, quotes, "*".repeat(val.len()), quotes)
            })
            .to_string();
    }
    output
}

struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

// Captures every event into the in-memory ring buffer consumed by the shell
struct MemoryLayer;

impl<S> Layer<S> for MemoryLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut visitor);

        let line = format!(
            "[{}] {} [{}] {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S%.6f"),
            event.metadata().level(),
            event.metadata().target(),
            sanitize_keywords(&visitor.message)
        );
        MEMORY_LOGS.lock().push(line);
    }
}

pub fn init_logger() {
    if LOGGER_INITIALIZED.swap(true, Ordering::SeqCst) {
        // Already wired up, the shell can call this on every launch
        return;
    }

    let env_filter = EnvFilter::try_from_env("NETMIRAGE_LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    // Optional file logging, the shell points this at its data directory
    let file_layer = match var("NETMIRAGE_LOG_DIR") {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "netmirage.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            *FILE_GUARD.lock() = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer),
            )
        }
        _ => None,
    };

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(file_layer)
        .with(MemoryLayer)
        .try_init();

    if result.is_err() {
        // A subscriber was already installed (tests, or a host app with its own)
        println!("Logger already installed, keeping the existing subscriber");
    }
}

// Lines accumulated since the last call, latest first
pub fn get_new_logs() -> String {
    let mut buffer = MEMORY_LOGS.lock();
    let to_take = buffer.unread;
    let logs: Vec<String> = buffer.lines.iter().take(to_take).cloned().collect();
    buffer.unread = 0;
    logs.join("\n")
}

pub fn get_all_logs() -> String {
    let buffer = MEMORY_LOGS.lock();
    buffer
        .lines
        .iter()
        .cloned()
        .collect::<Vec<String>>()
        .join("\n")
}
