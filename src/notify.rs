//! Push payload parsing and the user-notification seam.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// Title used when a push payload carries none.
pub const DEFAULT_TITLE: &str = "Kukaya";

/// Body used when a push payload carries none.
pub const DEFAULT_BODY: &str = "You have a new update from Kukaya.";

/// Icon shown on every notification.
pub const NOTIFICATION_ICON: &str = "/static/icons/icon-192.png";

/// Structured fields a push message may carry.
#[derive(Debug, Default, Deserialize)]
struct PushPayload {
    title: Option<String>,
    body: Option<String>,
}

/// A user-facing notification surfaced from a push message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// Icon path.
    pub icon: String,
}

impl Notification {
    /// Builds a notification from raw push data.
    ///
    /// Absent data, malformed JSON, and missing fields all fall back to
    /// the defaults; a bad payload is never an error.
    #[must_use]
    pub fn from_push(data: Option<&[u8]>) -> Self {
        let payload = data
            .and_then(|bytes| serde_json::from_slice::<PushPayload>(bytes).ok())
            .unwrap_or_default();

        Self {
            title: payload.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: payload.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            icon: NOTIFICATION_ICON.to_string(),
        }
    }
}

/// Abstraction over the host's notification surface.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Surfaces a notification to the user.
    async fn show(&self, notification: &Notification) -> Result<()>;

    /// Dismisses the currently displayed notification.
    async fn dismiss(&self) -> Result<()>;

    /// Focuses an open application window at `url`, or opens a new one.
    async fn focus_or_open(&self, url: &str) -> Result<()>;
}

/// Notifier that records events to the log, for headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn show(&self, notification: &Notification) -> Result<()> {
        log::info!("notification: {}: {}", notification.title, notification.body);
        Ok(())
    }

    async fn dismiss(&self) -> Result<()> {
        log::debug!("notification dismissed");
        Ok(())
    }

    async fn focus_or_open(&self, url: &str) -> Result<()> {
        log::info!("focusing client window at {url}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_payload_is_used_verbatim() {
        let data = br#"{"title":"Booking confirmed","body":"Room 4B is yours."}"#;
        let notification = Notification::from_push(Some(data));
        assert_eq!(notification.title, "Booking confirmed");
        assert_eq!(notification.body, "Room 4B is yours.");
        assert_eq!(notification.icon, NOTIFICATION_ICON);
    }

    #[test]
    fn empty_object_falls_back_to_defaults() {
        let notification = Notification::from_push(Some(b"{}"));
        assert_eq!(notification.title, DEFAULT_TITLE);
        assert_eq!(notification.body, DEFAULT_BODY);
    }

    #[test]
    fn absent_data_falls_back_to_defaults() {
        let notification = Notification::from_push(None);
        assert_eq!(notification.title, DEFAULT_TITLE);
        assert_eq!(notification.body, DEFAULT_BODY);
    }

    #[test]
    fn malformed_json_falls_back_to_defaults() {
        let notification = Notification::from_push(Some(b"not json at all"));
        assert_eq!(notification.title, DEFAULT_TITLE);
        assert_eq!(notification.body, DEFAULT_BODY);
    }

    #[test]
    fn partial_payload_keeps_what_it_has() {
        let notification = Notification::from_push(Some(br#"{"title":"Payment due"}"#));
        assert_eq!(notification.title, "Payment due");
        assert_eq!(notification.body, DEFAULT_BODY);
    }

    proptest! {
        #[test]
        fn arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let notification = Notification::from_push(Some(&data));
            prop_assert_eq!(notification.icon.as_str(), NOTIFICATION_ICON);
        }
    }
}
