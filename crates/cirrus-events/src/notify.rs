//! Notification building and publishing
//!
//! Translates processed storage events into one normalized notification
//! message and hands it to a [`Notifier`]. Publish failures are logged and
//! swallowed: notification delivery must never fail the event-processing
//! path.

use crate::error::NotifyError;
use crate::event::StorageEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing outcome for one object, embedded in the notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub bucket: String,
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    pub processing_type: String,
    pub actions: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

impl FileResult {
    pub fn from_event(event: &StorageEvent) -> Self {
        let kind = event.classify();
        Self {
            bucket: event.bucket.clone(),
            key: event.key.clone(),
            size: event.size,
            content_type: event.content_type.clone(),
            event_name: event.event_name.clone(),
            processing_type: kind.label().to_string(),
            actions: kind.actions().iter().map(|a| a.to_string()).collect(),
            processed_at: Utc::now(),
        }
    }
}

/// The normalized message published after a batch of events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub event_type: String,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
    pub processed_files_count: usize,
    pub summary: NotificationSummary,
    pub files: Vec<FileResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSummary {
    pub total_size: u64,
    pub processing_types: Vec<String>,
}

impl Notification {
    pub fn from_results(results: Vec<FileResult>, correlation_id: impl Into<String>) -> Self {
        let total_size = results.iter().filter_map(|f| f.size).sum();
        let mut processing_types: Vec<String> = Vec::new();
        for result in &results {
            if !processing_types.contains(&result.processing_type) {
                processing_types.push(result.processing_type.clone());
            }
        }

        Self {
            event_type: "storage_objects_processed".to_string(),
            correlation_id: correlation_id.into(),
            timestamp: Utc::now(),
            processed_files_count: results.len(),
            summary: NotificationSummary {
                total_size,
                processing_types,
            },
            files: results,
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "Storage objects processed - {} files",
            self.processed_files_count
        )
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Delivery sink for notifications (an SNS topic, a Service Bus topic, a
/// log). Implementations decide the wire shape.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Default sink: writes the notification to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            correlation_id = %notification.correlation_id,
            "{}: {}",
            notification.subject(),
            notification.to_json()
        );
        Ok(())
    }
}

/// Outcome of one handler invocation.
#[derive(Debug, Clone)]
pub struct ProcessingReport {
    pub results: Vec<FileResult>,
    /// False when the notifier failed; the invocation still succeeds.
    pub notified: bool,
}

/// Translate a batch of events and publish the consolidated notification.
///
/// A notifier failure is logged and swallowed so the primary
/// event-processing path cannot be taken down by its side channel.
pub async fn process_events(
    events: &[StorageEvent],
    notifier: &dyn Notifier,
    correlation_id: &str,
) -> ProcessingReport {
    let results: Vec<FileResult> = events.iter().map(FileResult::from_event).collect();

    tracing::info!(
        correlation_id = %correlation_id,
        "Processed {} storage events",
        results.len()
    );

    if results.is_empty() {
        return ProcessingReport {
            results,
            notified: false,
        };
    }

    let notification = Notification::from_results(results.clone(), correlation_id);
    let notified = match notifier.publish(&notification).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(
                correlation_id = %correlation_id,
                "Notification delivery failed: {}",
                e
            );
            false
        }
    };

    ProcessingReport { results, notified }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingNotifier {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn publish(&self, _notification: &Notification) -> Result<(), NotifyError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::Publish("topic unreachable".to_string()))
        }
    }

    fn events() -> Vec<StorageEvent> {
        vec![
            StorageEvent::from_blob_trigger("media/cat.png", Some(100))
                .unwrap()
                .with_content_type("image/png"),
            StorageEvent::from_blob_trigger("media/data.json", Some(50))
                .unwrap()
                .with_content_type("application/json"),
            StorageEvent::from_blob_trigger("media/dog.png", Some(25))
                .unwrap()
                .with_content_type("image/png"),
        ]
    }

    #[test]
    fn test_notification_summary_math() {
        let results: Vec<FileResult> = events().iter().map(FileResult::from_event).collect();
        let notification = Notification::from_results(results, "corr-1");

        assert_eq!(notification.processed_files_count, 3);
        assert_eq!(notification.summary.total_size, 175);
        assert_eq!(
            notification.summary.processing_types,
            vec!["image_processing", "json_validation"]
        );
        assert_eq!(notification.subject(), "Storage objects processed - 3 files");
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let notifier = FailingNotifier {
            attempts: AtomicUsize::new(0),
        };

        let report = process_events(&events(), &notifier, "corr-2").await;

        assert_eq!(report.results.len(), 3);
        assert!(!report.notified);
        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_publish() {
        let notifier = FailingNotifier {
            attempts: AtomicUsize::new(0),
        };

        let report = process_events(&[], &notifier, "corr-3").await;

        assert!(report.results.is_empty());
        assert!(!report.notified);
        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_log_notifier_succeeds() {
        let report = process_events(&events(), &LogNotifier, "corr-4").await;
        assert!(report.notified);
    }
}
