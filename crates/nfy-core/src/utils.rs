use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{errors::Error, Result};

/// RFC3339 timestamp in UTC (for logs/audit).
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

/// Truncate to at most `max_len` chars, appending `...` when shortened.
pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

// ============== Audit Logging ==============

/// One audit record. Message bodies and rejection texts are never audited;
/// only tokens, identities, and outcome kinds are.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEvent {
    pub fn compose(user_id: i64, token: &str, excluded_count: usize) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: "compose".to_string(),
            user_id: Some(user_id),
            username: None,
            token: Some(token.to_string()),
            excluded_count: Some(excluded_count),
            outcome: None,
            error: None,
        }
    }

    pub fn reveal(user_id: i64, username: Option<&str>, token: &str, outcome: &str) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: "reveal".to_string(),
            user_id: Some(user_id),
            username: username.map(|s| s.to_string()),
            token: Some(token.to_string()),
            excluded_count: None,
            outcome: Some(outcome.to_string()),
            error: None,
        }
    }

    pub fn override_change(user_id: i64, outcome: &str) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: "override".to_string(),
            user_id: Some(user_id),
            username: None,
            token: None,
            excluded_count: None,
            outcome: Some(outcome.to_string()),
            error: None,
        }
    }

    pub fn error(user_id: i64, error: &str) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: "error".to_string(),
            user_id: Some(user_id),
            username: None,
            token: None,
            excluded_count: None,
            outcome: None,
            error: Some(error.to_string()),
        }
    }
}

/// Append-only audit trail, one record per line (JSON or readable plaintext).
#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, event: AuditEvent) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            out.push_str(&json_value_to_display(v));
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

fn json_value_to_display(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.log"))
    }

    #[test]
    fn truncate_text_adds_ellipsis() {
        assert_eq!(truncate_text("short", 50), "short");
        let long = "я".repeat(60);
        let t = truncate_text(&long, 50);
        assert!(t.ends_with("..."));
        assert_eq!(t.chars().count(), 53);
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        // 40 cyrillic chars is 80 bytes; must stay untouched at a 50-char cap.
        let s = "ж".repeat(40);
        assert_eq!(truncate_text(&s, 50), s);
    }

    #[test]
    fn audit_writes_jsonl_records() {
        let log = AuditLogger::new(tmp_file("nfy-audit-test"), true);
        log.write(AuditEvent::reveal(7, Some("vasya"), "abc123", "denied"))
            .unwrap();
        log.write(AuditEvent::compose(1, "abc123", 2)).unwrap();

        let written = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "reveal");
        assert_eq!(first["outcome"], "denied");
        assert_eq!(first["username"], "vasya");
    }

    #[test]
    fn audit_plaintext_skips_unset_fields() {
        let log = AuditLogger::new(tmp_file("nfy-audit-plain"), false);
        log.write(AuditEvent::override_change(7, "set")).unwrap();

        let written = std::fs::read_to_string(log.path()).unwrap();
        assert!(written.contains("event: override"));
        assert!(written.contains("outcome: set"));
        assert!(!written.contains("token:"));
    }
}
