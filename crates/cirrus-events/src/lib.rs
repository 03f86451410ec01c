//! Cirrus storage-event translation
//!
//! The serverless half of the project: takes cloud storage-event payloads
//! (S3 event records, Azure blob triggers), normalizes them into
//! [`StorageEvent`] values, classifies each object by content type, and
//! publishes one consolidated [`Notification`] through a [`Notifier`].
//!
//! Delivery is best-effort by design: a failing notifier is logged and the
//! invocation still succeeds.

pub mod error;
pub mod event;
pub mod notify;

pub use error::{EventError, NotifyError, Result};
pub use event::{ProcessingKind, StorageEvent};
pub use notify::{
    FileResult, LogNotifier, Notification, NotificationSummary, Notifier, ProcessingReport,
    process_events,
};
