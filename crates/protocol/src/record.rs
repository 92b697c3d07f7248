//! Record envelope
//!
//! `Record<T>` carries one unit of telemetry through the pipeline together
//! with metadata the pipeline itself needs (arrival time, correlation id,
//! routing key). The payload is opaque to the engine.

use chrono::{DateTime, Utc};

/// Pipeline-internal metadata attached to every record
///
/// The arrival time is stamped when the record is created by a source or
/// processor. The correlation id and routing key are optional and only
/// interpreted by plugins (and by the partitioning sink policy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    arrival_time: DateTime<Utc>,
    correlation_id: Option<String>,
    routing_key: Option<String>,
}

impl RecordMetadata {
    /// Create metadata stamped with the current time
    #[inline]
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Create metadata with an explicit arrival time
    #[inline]
    pub fn at(arrival_time: DateTime<Utc>) -> Self {
        Self {
            arrival_time,
            correlation_id: None,
            routing_key: None,
        }
    }

    /// Set the correlation (trace) id
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Set a freshly generated correlation id
    pub fn with_random_correlation_id(self) -> Self {
        self.with_correlation_id(uuid::Uuid::new_v4().to_string())
    }

    /// Set the routing key used by partitioned sink delivery
    pub fn with_routing_key(mut self, key: impl Into<String>) -> Self {
        self.routing_key = Some(key.into());
        self
    }

    /// When the record entered the pipeline
    #[inline]
    pub fn arrival_time(&self) -> DateTime<Utc> {
        self.arrival_time
    }

    /// Correlation id, if any
    #[inline]
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Routing key, if any
    #[inline]
    pub fn routing_key(&self) -> Option<&str> {
        self.routing_key.as_deref()
    }
}

impl Default for RecordMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// One unit of payload data moving through the pipeline
///
/// A record is immutable once created: there is no mutable access to the
/// payload or metadata. Processors that need a different payload consume the
/// record with [`Record::map`] or derive a sibling with [`Record::with_data`].
///
/// # Example
///
/// ```
/// use sluice_protocol::Record;
///
/// let record = Record::new("hello".to_string());
/// let upper = record.map(|s| s.to_uppercase());
/// assert_eq!(upper.data(), "HELLO");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    data: T,
    metadata: RecordMetadata,
}

impl<T> Record<T> {
    /// Wrap a payload, stamping the arrival time now
    #[inline]
    pub fn new(data: T) -> Self {
        Self {
            data,
            metadata: RecordMetadata::new(),
        }
    }

    /// Wrap a payload with explicit metadata
    #[inline]
    pub fn with_metadata(data: T, metadata: RecordMetadata) -> Self {
        Self { data, metadata }
    }

    /// Borrow the payload
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Borrow the metadata
    #[inline]
    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    /// Consume the record and return its payload
    #[inline]
    pub fn into_data(self) -> T {
        self.data
    }

    /// Consume the record and return payload and metadata
    #[inline]
    pub fn into_parts(self) -> (T, RecordMetadata) {
        (self.data, self.metadata)
    }

    /// Produce a new record from this one's payload, keeping the metadata
    pub fn map<U, F>(self, f: F) -> Record<U>
    where
        F: FnOnce(T) -> U,
    {
        Record {
            data: f(self.data),
            metadata: self.metadata,
        }
    }

    /// Derive a new record that shares this record's metadata
    ///
    /// Used by processors that emit additional records (e.g. summaries)
    /// correlated with an input record.
    pub fn with_data<U>(&self, data: U) -> Record<U> {
        Record {
            data,
            metadata: self.metadata.clone(),
        }
    }
}

impl<T> From<T> for Record<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}
