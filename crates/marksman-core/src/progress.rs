//! Progress broadcasting.
//!
//! The orchestrator publishes discrete events to an injected sink as a
//! request moves through its states. Publish failures are swallowed and
//! logged by the caller; they never affect the grading flow.

use serde::Serialize;

/// A progress event emitted during one grading request.
///
/// `Progress` events arrive in completion order, not configuration order,
/// since they represent real-time status.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// Grading was admitted and examiners are being dispatched.
    Started { total_examiners: usize },
    /// One examiner finished.
    Progress {
        examiner_id: String,
        /// Completed examiners as a rounded percentage of the total.
        percent: u8,
        succeeded: bool,
    },
    /// The request finished with a full result.
    Completed { overall_score: f64, grade: String },
    /// The request was rejected before any examiner ran.
    Failed { code: String, message: String },
}

/// Sink for progress events.
pub trait ProgressSink: Send + Sync {
    /// Publish one event. Errors are logged and dropped by the caller.
    fn publish(&self, event: &ProgressEvent) -> anyhow::Result<()>;
}

/// Sink that discards every event.
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn publish(&self, _event: &ProgressEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = ProgressEvent::Started { total_examiners: 4 };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""kind":"started""#));
        assert!(json.contains(r#""total_examiners":4"#));

        let event = ProgressEvent::Progress {
            examiner_id: "analysis".into(),
            percent: 50,
            succeeded: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""kind":"progress""#));
        assert!(json.contains(r#""percent":50"#));

        let event = ProgressEvent::Failed {
            code: "rate_limited".into(),
            message: "retry later".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""kind":"failed""#));
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let sink = NoopSink;
        assert!(sink
            .publish(&ProgressEvent::Completed {
                overall_score: 7.5,
                grade: "B".into(),
            })
            .is_ok());
    }
}
