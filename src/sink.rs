use serde_json::Value;

use crate::models::RequestRecord;

/// Destination for the human-readable line the tracker emits per accepted
/// request. Passed into the tracker explicitly instead of a global logger.
pub trait RequestSink {
    fn accepted(&self, record: &RequestRecord, count: usize, limit: usize);
}

/// Writes each line as an `info` event; shown with `--verbose`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl RequestSink for TracingSink {
    fn accepted(&self, record: &RequestRecord, count: usize, limit: usize) {
        for line in request_lines(record, count, limit) {
            tracing::info!("{line}");
        }
    }
}

/// Header line followed by one aligned `key : value` line per metadata field.
pub fn request_lines(record: &RequestRecord, count: usize, limit: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(record.metadata.len() + 1);
    lines.push(format!(
        "{} -- Request {} of {}",
        record.timestamp, count, limit
    ));

    let width = record.metadata.keys().map(|k| k.len()).max().unwrap_or(0) + 1;
    for (key, value) in &record.metadata {
        lines.push(format!("  {key:<width$}: {}", display_value(value)));
    }

    lines
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_lines_header() {
        let record = RequestRecord::new("2024-03-09T12:00:00");
        let lines = request_lines(&record, 3, 50);
        assert_eq!(lines, vec!["2024-03-09T12:00:00 -- Request 3 of 50"]);
    }

    #[test]
    fn test_request_lines_pads_keys_to_common_width() {
        let record = RequestRecord::new("2024-03-09T12:00:00")
            .with("username", "jdoe")
            .with("id", "abc")
            .with("width", 3840);
        let lines = request_lines(&record, 1, 50);

        assert_eq!(lines[1], "  username : jdoe");
        assert_eq!(lines[2], "  id       : abc");
        assert_eq!(lines[3], "  width    : 3840");
    }
}
