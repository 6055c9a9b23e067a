//! Plain-text transcript rendering for closed tickets.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::platform::HistoryMessage;

const TRANSCRIPT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub created_unix_ms: i64,
    pub author: String,
    pub content: String,
}

impl From<&HistoryMessage> for TranscriptEntry {
    fn from(message: &HistoryMessage) -> Self {
        Self {
            created_unix_ms: message.created_unix_ms,
            author: message.author_name.clone(),
            content: message.content.clone(),
        }
    }
}

fn format_timestamp(created_unix_ms: i64, tz: Tz) -> String {
    DateTime::<Utc>::from_timestamp_millis(created_unix_ms)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .with_timezone(&tz)
        .format(TRANSCRIPT_TIMESTAMP_FORMAT)
        .to_string()
}

/// `[YYYY-MM-DD HH:MM:SS TZ] author: content` with line breaks folded to spaces.
pub fn render_transcript_line(entry: &TranscriptEntry, tz: Tz) -> String {
    let content = entry
        .content
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "[{}] {}: {}",
        format_timestamp(entry.created_unix_ms, tz),
        entry.author,
        content
    )
}

/// Renders entries in the order given, one newline-terminated line each.
pub fn render_transcript(entries: &[TranscriptEntry], tz: Tz) -> String {
    let mut transcript = String::new();
    for entry in entries {
        transcript.push_str(&render_transcript_line(entry, tz));
        transcript.push('\n');
    }
    transcript
}

pub fn transcript_file_name(channel_name: &str) -> String {
    format!("{channel_name}_transcript.txt")
}
