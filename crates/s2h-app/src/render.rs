//! Plain-text rendering of transcript lines and history records.

use s2h_chat::HealthRecord;
use s2h_common::{Message, Sender};

const BOT_LABEL: &str = "Stress2Health";

pub fn message_line(msg: &Message, display_name: Option<&str>) -> String {
    let label = match msg.sender {
        Sender::User => display_name.unwrap_or("You"),
        Sender::Bot => BOT_LABEL,
    };
    let mut lines = msg.text.lines();
    let first = lines.next().unwrap_or_default();
    let mut out = format!("[{}] {label}: {first}", msg.timestamp);
    let indent = " ".repeat(msg.timestamp.len() + 3 + label.len() + 2);
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(&indent);
            out.push_str(line);
        }
    }
    out
}

pub fn error_line(error: &str) -> String {
    format!("  ! {error}\n  (type /retry to try again)")
}

pub fn greeting(display_name: Option<&str>) -> String {
    match display_name {
        Some(name) => format!("Hi {name}, welcome back."),
        None => "Type /name <your name> to personalize, /help for commands.".to_string(),
    }
}

/// Shown above a restored transcript; `saved_at_ms` is Unix milliseconds.
pub fn resumed_line(saved_at_ms: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(saved_at_ms) {
        Some(dt) => format!(
            "(resuming conversation saved {})",
            dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
        ),
        None => "(resuming previous conversation)".to_string(),
    }
}

pub fn record_block(record: &HealthRecord) -> String {
    let data = &record.data;
    format!(
        "{}\n  Stress: {}  Sleep: {}h  BMI: {:.1}  Activity: {}\n  {}",
        format_created_at(&record.created_at),
        data.stress_level,
        data.sleep_hours,
        data.bmi,
        data.activity_level,
        data.health_risks,
    )
}

fn format_created_at(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

pub const HELP: &str = "\
Commands:
  /new            start a new conversation
  /retry          resend the message that failed
  /name <name>    set how the assistant addresses you
  /history        show your saved assessments (signed-in only)
  /help           show this help
  /quit           exit";
