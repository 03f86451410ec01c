//! Storage event payloads
//!
//! One normalized shape for "an object landed in cloud storage",
//! regardless of whether the trigger was an S3 event record or an Azure
//! blob trigger path.

use crate::error::{EventError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single storage upload event, normalized across providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEvent {
    /// Source provider ("aws", "azure").
    pub provider: String,
    /// Bucket (S3) or container (Blob Storage).
    pub bucket: String,
    /// Object key within the bucket/container.
    pub key: String,
    /// Object size in bytes, when the trigger reports it.
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Native event name (e.g. "ObjectCreated:Put").
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl StorageEvent {
    /// Parse one record of an S3 event payload.
    pub fn from_s3_record(record: &Value) -> Result<Self> {
        let s3 = record
            .get("s3")
            .ok_or(EventError::MissingField("s3"))?;
        let bucket = s3
            .pointer("/bucket/name")
            .and_then(Value::as_str)
            .ok_or(EventError::MissingField("s3.bucket.name"))?;
        let key = s3
            .pointer("/object/key")
            .and_then(Value::as_str)
            .ok_or(EventError::MissingField("s3.object.key"))?;

        Ok(Self {
            provider: "aws".to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: s3.pointer("/object/size").and_then(Value::as_u64),
            content_type: None,
            event_name: record
                .get("eventName")
                .and_then(Value::as_str)
                .map(str::to_string),
            occurred_at: record
                .get("eventTime")
                .and_then(Value::as_str)
                .and_then(|t| t.parse().ok()),
        })
    }

    /// Build from an Azure blob trigger path (`container/blob-key`).
    /// Without a separator the container defaults to "default".
    pub fn from_blob_trigger(path: &str, size: Option<u64>) -> Result<Self> {
        if path.is_empty() {
            return Err(EventError::MissingField("blob path"));
        }

        let (bucket, key) = match path.split_once('/') {
            Some((container, key)) => (container.to_string(), key.to_string()),
            None => ("default".to_string(), path.to_string()),
        };

        Ok(Self {
            provider: "azure".to_string(),
            bucket,
            key,
            size,
            content_type: None,
            event_name: Some("BlobCreated".to_string()),
            occurred_at: None,
        })
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Processing category for this object's content type.
    pub fn classify(&self) -> ProcessingKind {
        match self.content_type.as_deref() {
            Some(t) if t.starts_with("image/") => ProcessingKind::Image,
            Some(t) if t.starts_with("application/json") => ProcessingKind::Json,
            Some(t) if t.starts_with("text/") => ProcessingKind::Text,
            _ => ProcessingKind::Generic,
        }
    }
}

/// What a downstream processor would do with the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingKind {
    Image,
    Json,
    Text,
    Generic,
}

impl ProcessingKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingKind::Image => "image_processing",
            ProcessingKind::Json => "json_validation",
            ProcessingKind::Text => "text_analysis",
            ProcessingKind::Generic => "generic_processing",
        }
    }

    /// Follow-up actions attached to the notification.
    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            ProcessingKind::Image => &["thumbnail_generation", "metadata_extraction"],
            ProcessingKind::Json => &["schema_validation", "data_enrichment"],
            ProcessingKind::Text => &["content_indexing", "sentiment_analysis"],
            ProcessingKind::Generic => &["virus_scan", "metadata_extraction"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3_record() -> Value {
        serde_json::json!({
            "eventSource": "aws:s3",
            "eventName": "ObjectCreated:Put",
            "eventTime": "2025-06-01T12:30:00Z",
            "s3": {
                "bucket": { "name": "uploads" },
                "object": { "key": "reports/q2.json", "size": 2048 }
            }
        })
    }

    #[test]
    fn test_from_s3_record() {
        let event = StorageEvent::from_s3_record(&s3_record()).unwrap();
        assert_eq!(event.provider, "aws");
        assert_eq!(event.bucket, "uploads");
        assert_eq!(event.key, "reports/q2.json");
        assert_eq!(event.size, Some(2048));
        assert_eq!(event.event_name.as_deref(), Some("ObjectCreated:Put"));
        assert!(event.occurred_at.is_some());
    }

    #[test]
    fn test_from_s3_record_missing_bucket() {
        let record = serde_json::json!({ "s3": { "object": { "key": "x" } } });
        let err = StorageEvent::from_s3_record(&record).unwrap_err();
        assert!(err.to_string().contains("s3.bucket.name"));
    }

    #[test]
    fn test_from_blob_trigger_splits_container() {
        let event = StorageEvent::from_blob_trigger("media/photos/cat.png", Some(512)).unwrap();
        assert_eq!(event.provider, "azure");
        assert_eq!(event.bucket, "media");
        // Only the first separator splits.
        assert_eq!(event.key, "photos/cat.png");
        assert_eq!(event.size, Some(512));
    }

    #[test]
    fn test_from_blob_trigger_without_separator() {
        let event = StorageEvent::from_blob_trigger("orphan.bin", None).unwrap();
        assert_eq!(event.bucket, "default");
        assert_eq!(event.key, "orphan.bin");
    }

    #[test]
    fn test_classification() {
        let base = StorageEvent::from_blob_trigger("c/k", None).unwrap();
        assert_eq!(
            base.clone().with_content_type("image/png").classify(),
            ProcessingKind::Image
        );
        assert_eq!(
            base.clone()
                .with_content_type("application/json; charset=utf-8")
                .classify(),
            ProcessingKind::Json
        );
        assert_eq!(
            base.clone().with_content_type("text/csv").classify(),
            ProcessingKind::Text
        );
        assert_eq!(
            base.clone().with_content_type("application/zip").classify(),
            ProcessingKind::Generic
        );
        assert_eq!(base.classify(), ProcessingKind::Generic);
    }

    #[test]
    fn test_actions_per_kind() {
        assert!(ProcessingKind::Image.actions().contains(&"thumbnail_generation"));
        assert!(ProcessingKind::Generic.actions().contains(&"virus_scan"));
    }
}
