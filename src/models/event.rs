//! Status event construction

use chrono::Utc;

use crate::models::{StatusEvent, StatusEventKind, StatusMap};

impl StatusEvent {
    pub fn snapshot(pipeline: impl Into<String>, statuses: StatusMap) -> Self {
        Self::new(StatusEventKind::Snapshot, pipeline.into(), statuses)
    }

    pub fn update(pipeline: impl Into<String>, statuses: StatusMap) -> Self {
        Self::new(StatusEventKind::Update, pipeline.into(), statuses)
    }

    fn new(kind: StatusEventKind, pipeline: String, statuses: StatusMap) -> Self {
        Self {
            kind,
            pipeline,
            statuses,
            timestamp: Utc::now(),
        }
    }
}
