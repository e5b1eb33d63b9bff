use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::ChatLogError;

pub const CHAT_FILE_PREFIX: &str = "chat_";
pub const CHAT_FILE_EXTENSION: &str = "json";
pub const MARKDOWN_EXTENSION: &str = "md";

/// Compact `YYYYMMDD_HHMMSS` stamp used in file names and records.
pub fn chat_stamp(at: OffsetDateTime) -> Result<String, ChatLogError> {
    at.format(format_description!(
        "[year][month][day]_[hour][minute][second]"
    ))
    .map_err(ChatLogError::ClockFormat)
}

/// `chat_<stamp>.json`, or `chat_<stamp>_<n>.json` for the n-th same-second save.
#[must_use]
pub fn chat_file_name(stamp: &str, collision: u32) -> String {
    if collision == 0 {
        format!("{CHAT_FILE_PREFIX}{stamp}.{CHAT_FILE_EXTENSION}")
    } else {
        format!("{CHAT_FILE_PREFIX}{stamp}_{collision}.{CHAT_FILE_EXTENSION}")
    }
}

/// Ordering key `(stamp, collision)` for a chat log file name, or `None` when
/// the name is not a chat log.
#[must_use]
pub fn parse_chat_file_name(file_name: &str) -> Option<(String, u32)> {
    let stem = file_name
        .strip_prefix(CHAT_FILE_PREFIX)?
        .strip_suffix(".json")?;

    // YYYYMMDD_HHMMSS is 15 bytes.
    let stamp = stem.get(..15)?;
    if !is_stamp(stamp) {
        return None;
    }
    let collision = match &stem[15..] {
        "" => 0,
        rest => rest.strip_prefix('_')?.parse().ok()?,
    };
    Some((stamp.to_string(), collision))
}

fn is_stamp(value: &str) -> bool {
    value.bytes().enumerate().all(|(index, byte)| {
        if index == 8 {
            byte == b'_'
        } else {
            byte.is_ascii_digit()
        }
    })
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn stamp_is_compact_local_form() {
        let stamp = chat_stamp(datetime!(2026-03-07 09:05:01 UTC)).expect("format");
        assert_eq!(stamp, "20260307_090501");
    }

    #[test]
    fn file_names_round_trip_through_parser() {
        assert_eq!(chat_file_name("20260307_090501", 0), "chat_20260307_090501.json");
        assert_eq!(
            parse_chat_file_name("chat_20260307_090501.json"),
            Some(("20260307_090501".to_string(), 0))
        );
        assert_eq!(
            parse_chat_file_name(&chat_file_name("20260307_090501", 12)),
            Some(("20260307_090501".to_string(), 12))
        );
    }

    #[test]
    fn unrelated_names_are_ignored() {
        assert_eq!(parse_chat_file_name("chat_20260307_090501.md"), None);
        assert_eq!(parse_chat_file_name("notes.json"), None);
        assert_eq!(parse_chat_file_name("chat_latest.json"), None);
        assert_eq!(parse_chat_file_name("chat_20260307_090501_x.json"), None);
    }
}
