use chrono::Local;
use nu_ansi_term::{Color, Style};
use std::fmt;
use std::path::Path;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Targets,
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    prelude::*,
    registry::LookupSpan,
};

/// Targets that log at INFO. Everything else only reaches the sinks at WARN.
const BOT_TARGETS: &[&str] = &["core_logic", "klokapp_bot"];

/// Installs the console + file subscriber.
///
/// The file is opened in append mode and never rotated, so consecutive runs
/// keep extending the same event log. The returned guard flushes the file
/// writer on drop and must be kept alive by the caller.
pub fn setup_logger(log_dir: impl AsRef<Path>, file_name: &str) -> Option<WorkerGuard> {
    let log_dir = log_dir.as_ref();
    std::fs::create_dir_all(log_dir).ok();

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(bot_filter());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .event_format(TerminalFormatter)
        .with_filter(bot_filter());

    // try_init: a second call (tests, embedding) keeps the first subscriber
    if tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .is_err()
    {
        return None;
    }

    Some(guard)
}

fn bot_filter() -> Targets {
    BOT_TARGETS
        .iter()
        .fold(Targets::new(), |targets, name| {
            targets.with_target(*name, Level::INFO)
        })
        .with_default(Level::WARN)
}

// --- Formatters ---

struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

fn event_message(event: &Event<'_>) -> String {
    let mut visitor = MessageVisitor {
        message: String::new(),
    };
    event.record(&mut visitor);
    visitor.message
}

/// Highlights the status words session logs use.
pub fn colorize_status(msg: &str) -> String {
    if msg.contains("Success") {
        let green = Style::new().fg(Color::LightGreen).bold();
        msg.replace("Success", &green.paint("Success").to_string())
    } else if msg.contains("Failed") {
        let red = Style::new().fg(Color::LightRed).bold();
        msg.replace("Failed", &red.paint("Failed").to_string())
    } else {
        msg.to_string()
    }
}

pub struct TerminalFormatter;

impl<S, N> FormatEvent<S, N> for TerminalFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%H:%M:%S");
        let msg = colorize_status(&event_message(event));

        match *event.metadata().level() {
            Level::ERROR => write!(writer, "{} {} ", timestamp, Color::LightRed.paint("ERROR"))?,
            Level::WARN => write!(writer, "{} {} ", timestamp, Color::Yellow.paint("WARN "))?,
            _ => write!(writer, "{} ", timestamp)?,
        }
        writeln!(writer, "{}", msg)
    }
}

pub struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let level = event.metadata().level();

        write!(writer, "{} [{}] ", timestamp, level)?;
        writeln!(writer, "{}", event_message(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorize_leaves_plain_messages_alone() {
        assert_eq!(colorize_status("sleeping 5m"), "sleeping 5m");
    }

    #[test]
    fn colorize_wraps_status_word() {
        let out = colorize_status("[WL:001] Success chat 1/3");
        assert!(out.contains("Success"));
        assert_ne!(out, "[WL:001] Success chat 1/3");
    }
}
