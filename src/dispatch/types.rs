use crate::error::{BroadcasterError, Result};
use crate::slack::ChannelId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /dispatch`. Both fields are optional so that a missing field
/// is reported as a validation error rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchRequest {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default, alias = "channels")]
    pub destinations: Option<Vec<String>>,
}

/// A request that passed validation; ids keep their order and duplicates
#[derive(Debug, Clone)]
pub struct DispatchBatch {
    pub message: String,
    pub destinations: Vec<ChannelId>,
}

impl DispatchRequest {
    pub fn new(message: impl Into<String>, destinations: &[&str]) -> Self {
        Self {
            message: Some(message.into()),
            destinations: Some(destinations.iter().map(|d| d.to_string()).collect()),
        }
    }

    pub fn validate(self) -> Result<DispatchBatch> {
        let message = self
            .message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| BroadcasterError::Validation("Missing message".to_string()))?;

        let destinations = self
            .destinations
            .filter(|d| !d.is_empty())
            .ok_or_else(|| BroadcasterError::Validation("Missing destinations".to_string()))?;

        Ok(DispatchBatch {
            message,
            destinations: destinations.into_iter().map(ChannelId::new).collect(),
        })
    }
}

/// Outcome of sending to one destination
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub destination_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchResult {
    pub fn sent(destination: &ChannelId) -> Self {
        Self {
            destination_id: destination.to_string(),
            success: true,
            error: None,
        }
    }

    pub fn failed(destination: &ChannelId, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            destination_id: destination.to_string(),
            success: false,
            error: Some(if error.is_empty() {
                "unknown_error".to_string()
            } else {
                error
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DispatchSummary {
    pub successful: usize,
    pub failed: usize,
    /// Number of requested ids, duplicates included
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub dispatch_id: Uuid,
    pub message: String,
    /// One entry per requested id, in request order
    pub results: Vec<DispatchResult>,
    pub summary: DispatchSummary,
}

impl DispatchReport {
    pub fn new(dispatch_id: Uuid, results: Vec<DispatchResult>) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        let summary = DispatchSummary {
            successful,
            failed: total - successful,
            total,
        };

        let message = if summary.failed == 0 {
            "Message dispatched".to_string()
        } else {
            format!(
                "Message dispatched with {} of {} failed",
                summary.failed, summary.total
            )
        };

        Self {
            dispatch_id,
            message,
            results,
            summary,
        }
    }

    pub fn success_rate(&self) -> u32 {
        if self.summary.total > 0 {
            (self.summary.successful as f32 / self.summary.total as f32 * 100.0) as u32
        } else {
            0
        }
    }
}
