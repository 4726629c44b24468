//! Operator-facing notification channel.

/// Broadcast sink for human-readable status, progress, and result
/// messages.
///
/// The pipeline decides content and sequencing only; rendering (color,
/// layout, chat vs. console) belongs to the embedder. Implementations must
/// be cheap enough to call from hot paths or hand the message off
/// themselves.
pub trait NotificationSink: Send + Sync {
    fn broadcast(&self, message: String);
}
