// Output envelope: every run prints exactly one of these as a single line
// of JSON on stdout.

use serde::Serialize;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::io::Write;

use crate::followers::FollowerSummary;

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum Envelope {
    /// Follower listing, printed as a bare array.
    Followers(Vec<FollowerSummary>),
    Success { success: bool, message: String },
    /// Argument problems caught before any flow runs.
    Error { error: String },
    /// Anything that went wrong inside a flow.
    Failure { error: String, traceback: String },
    /// `--help` / `--version` output.
    Usage { usage: String },
}

impl Envelope {
    pub fn success(message: &str) -> Self {
        Envelope::Success {
            success: true,
            message: message.to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Envelope::Error {
            error: message.into(),
        }
    }

    pub fn usage(text: impl Into<String>) -> Self {
        Envelope::Usage { usage: text.into() }
    }

    /// `error` is the outermost message, `traceback` the whole cause chain
    /// plus a stack backtrace. When the error carries no captured backtrace
    /// one is taken here, at the flow boundary.
    pub fn failure(err: &anyhow::Error) -> Self {
        let mut traceback = format!("{:?}", err);
        if err.backtrace().status() != BacktraceStatus::Captured {
            traceback.push_str("\n\nStack backtrace:\n");
            traceback.push_str(&Backtrace::force_capture().to_string());
        }
        Envelope::Failure {
            error: err.to_string(),
            traceback,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Followers(_) | Envelope::Success { .. })
    }

    pub fn to_json_line(&self) -> String {
        // Serializing these variants cannot fail: only strings, bools and
        // vectors of plain structs.
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "error": e.to_string() }).to_string()
        })
    }

    /// Write the envelope followed by a newline and flush.
    pub fn emit<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", self.to_json_line())?;
        out.flush()
    }
}

#[cfg(test)]
mod tests_envelope {
    use super::*;
    use anyhow::Context;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[test]
    fn test_argument_error_shape() {
        let line = Envelope::error("Image path not provided").to_json_line();
        assert_eq!(line, r#"{"error":"Image path not provided"}"#);
    }

    #[test]
    fn test_success_shape() {
        let value: Value =
            serde_json::from_str(&Envelope::success("Banner updated successfully").to_json_line())
                .unwrap();
        assert_eq!(
            value,
            json!({"success": true, "message": "Banner updated successfully"})
        );
    }

    #[test]
    fn test_failure_has_message_and_traceback_but_no_success() {
        let err = std::fs::read("/definitely/not/here.jpg")
            .context("Failed to read image file")
            .unwrap_err();
        let envelope = Envelope::failure(&err);
        assert!(!envelope.is_success());

        let value: Value = serde_json::from_str(&envelope.to_json_line()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["error"], "Failed to read image file");
        let traceback = obj["traceback"].as_str().unwrap();
        assert!(traceback.contains("Caused by"));
        assert!(!obj.contains_key("success"));
    }

    #[test]
    fn test_failure_without_cause_still_has_stack() {
        let err = anyhow::anyhow!("Login failed: 403 - denied");
        let value: Value = serde_json::from_str(&Envelope::failure(&err).to_json_line()).unwrap();

        let error = value["error"].as_str().unwrap();
        let traceback = value["traceback"].as_str().unwrap();
        assert_eq!(error, "Login failed: 403 - denied");
        assert_ne!(traceback, error);
        assert!(traceback.starts_with(error));
        assert!(traceback.contains("Stack backtrace:"));
        assert!(traceback.len() > error.len());
    }

    #[test]
    fn test_usage_shape() {
        let line = Envelope::usage("banner-shim 0.1.0").to_json_line();
        assert_eq!(line, r#"{"usage":"banner-shim 0.1.0"}"#);
    }

    #[test]
    fn test_emit_writes_one_line() {
        let mut out = Vec::new();
        Envelope::Followers(vec![FollowerSummary {
            id: "1".into(),
            name: "One\nTwo".into(),
            profile_image_url: None,
        }])
        .emit(&mut out)
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));
        assert!(text.starts_with('['));
    }
}
