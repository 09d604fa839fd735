use serde::Serialize;
use tracing::info;

/// Summary of one completed match, pushed to interested listeners
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEvent {
    pub phrase_count: usize,
    pub match_count: usize,
    /// Matches at or above the low-confidence threshold
    pub strong_matches: usize,
    pub low_confidence: bool,
}

impl MatchEvent {
    /// Human readable one-liner
    pub fn message(&self) -> String {
        format!(
            "New matches found: {} jobs matched, {} above the confidence threshold",
            self.match_count, self.strong_matches
        )
    }
}

/// Receives match events. Delivery (sockets, queues) is up to the implementor.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &MatchEvent);
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: &MatchEvent) {}
}

/// Writes events to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, event: &MatchEvent) {
        if event.match_count > 0 {
            info!(
                phrases = event.phrase_count,
                matches = event.match_count,
                strong = event.strong_matches,
                low_confidence = event.low_confidence,
                "{}",
                event.message()
            );
        }
    }
}
