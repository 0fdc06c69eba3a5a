//! JSON envelopes printed by every subcommand.

use anyhow::{Context, Result};
use notevault_core::{ErrorKind, FieldError, NoteSlug, RevisionHistory, ServiceError};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl Envelope {
    pub fn success(message: impl Into<String>, data: &impl Serialize) -> Result<Self> {
        Ok(Self {
            message: message.into(),
            data: Some(serde_json::to_value(data).context("failed to serialize response data")?),
            error: None,
        })
    }

    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, err: &ServiceError) -> Self {
        Self {
            message: message.into(),
            data: None,
            error: Some(ErrorBody {
                kind: err.kind(),
                detail: err.to_string(),
                fields: err.field_errors().to_vec(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn print(&self) -> Result<()> {
        let rendered =
            serde_json::to_string_pretty(self).context("failed to render response envelope")?;
        println!("{rendered}");
        Ok(())
    }
}

/// One history row as shown to clients.
#[derive(Debug, Serialize)]
pub struct HistoryRow {
    pub id: i64,
    pub note_slug: NoteSlug,
    pub original_content: String,
    pub updated_content: String,
    pub modified_by: String,
    pub modified_time: String,
}

pub fn history_rows(history: RevisionHistory) -> Vec<HistoryRow> {
    history
        .into_entries()
        .into_iter()
        .map(|entry| HistoryRow {
            modified_time: entry.modified_time(),
            id: entry.id,
            note_slug: entry.note_slug,
            original_content: entry.original_content,
            updated_content: entry.updated_content,
            modified_by: entry.updated_by_email,
        })
        .collect()
}
