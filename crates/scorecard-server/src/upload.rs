//! Single-flight upload session.
//!
//! At most one analysis runs at a time. A submission moves the session to
//! `Pending`; the outcome of that exact call moves it to `Succeeded` or
//! `Failed`. Outcomes carrying an older ticket are discarded.

use analysis_client::PdfUpload;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use scorecard_core::AnalyzeResponse;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;

/// Identifies one accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Raw form data as it came off the wire.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
    /// `X-Request-Id` of the upload request, kept for log correlation.
    pub request_id: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejection {
    #[error("Please select a PDF file.")]
    NoFile,

    #[error("Only PDF files are accepted")]
    NotPdf,

    #[error("An analysis is already in progress.")]
    InFlight,
}

impl SubmitRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            SubmitRejection::NoFile | SubmitRejection::NotPdf => StatusCode::BAD_REQUEST,
            SubmitRejection::InFlight => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, Clone)]
pub enum UploadState {
    Idle,
    Pending {
        ticket: Ticket,
        file_name: String,
        fingerprint: String,
        request_id: Option<String>,
        started_at: DateTime<Utc>,
    },
    Succeeded {
        file_name: String,
        fingerprint: String,
        request_id: Option<String>,
        response: Arc<AnalyzeResponse>,
        completed_at: DateTime<Utc>,
    },
    Failed {
        file_name: String,
        message: String,
        request_id: Option<String>,
        completed_at: DateTime<Utc>,
    },
}

#[derive(Debug)]
pub struct UploadSession {
    state: UploadState,
    next_ticket: u64,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            state: UploadState::Idle,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, UploadState::Pending { .. })
    }

    /// Validates a submission and, if accepted, enters `Pending`.
    ///
    /// A rejected submission leaves the session untouched.
    pub fn begin(&mut self, submission: Submission) -> Result<(Ticket, PdfUpload), SubmitRejection> {
        if self.is_pending() {
            return Err(SubmitRejection::InFlight);
        }

        let file_name = match submission.file_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() && !submission.bytes.is_empty() => name.to_string(),
            _ => return Err(SubmitRejection::NoFile),
        };
        if !is_pdf_name(&file_name) {
            return Err(SubmitRejection::NotPdf);
        }

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        let sha256 = fingerprint(&submission.bytes);

        tracing::info!(
            file = %file_name,
            bytes = submission.bytes.len(),
            sha256 = %sha256,
            ticket = ticket.0,
            request_id = submission.request_id.as_deref().unwrap_or("-"),
            "Analysis started"
        );

        self.state = UploadState::Pending {
            ticket,
            file_name: file_name.clone(),
            fingerprint: sha256,
            request_id: submission.request_id,
            started_at: Utc::now(),
        };

        Ok((ticket, PdfUpload::new(file_name, submission.bytes)))
    }

    /// Records the outcome of the call identified by `ticket`.
    ///
    /// Returns `false` when the ticket no longer matches the pending call.
    pub fn finish(&mut self, ticket: Ticket, outcome: Result<AnalyzeResponse, String>) -> bool {
        let (file_name, fingerprint, request_id) = match &self.state {
            UploadState::Pending {
                ticket: current,
                file_name,
                fingerprint,
                request_id,
                ..
            } if *current == ticket => (file_name.clone(), fingerprint.clone(), request_id.clone()),
            _ => return false,
        };

        let completed_at = Utc::now();
        self.state = match outcome {
            Ok(response) => UploadState::Succeeded {
                file_name,
                fingerprint,
                request_id,
                response: Arc::new(response),
                completed_at,
            },
            Err(message) => UploadState::Failed {
                file_name,
                message,
                request_id,
                completed_at,
            },
        };
        true
    }

    /// Clears the current report or error. Refused while a call is in flight.
    pub fn reset(&mut self) -> Result<(), SubmitRejection> {
        if self.is_pending() {
            return Err(SubmitRejection::InFlight);
        }
        self.state = UploadState::Idle;
        Ok(())
    }

    pub fn summary(&self) -> StateSummary {
        match &self.state {
            UploadState::Idle => StateSummary {
                status: "idle",
                ..Default::default()
            },
            UploadState::Pending {
                file_name,
                fingerprint,
                request_id,
                started_at,
                ..
            } => StateSummary {
                status: "pending",
                file_name: Some(file_name.clone()),
                sha256: Some(fingerprint.clone()),
                request_id: request_id.clone(),
                started_at: Some(*started_at),
                ..Default::default()
            },
            UploadState::Succeeded {
                file_name,
                fingerprint,
                request_id,
                completed_at,
                ..
            } => StateSummary {
                status: "succeeded",
                file_name: Some(file_name.clone()),
                sha256: Some(fingerprint.clone()),
                request_id: request_id.clone(),
                completed_at: Some(*completed_at),
                ..Default::default()
            },
            UploadState::Failed {
                file_name,
                message,
                request_id,
                completed_at,
            } => StateSummary {
                status: "failed",
                file_name: Some(file_name.clone()),
                error: Some(message.clone()),
                request_id: request_id.clone(),
                completed_at: Some(*completed_at),
                ..Default::default()
            },
        }
    }
}

/// What `/api/state` reports about the session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StateSummary {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

fn is_pdf_name(name: &str) -> bool {
    name.len() > 4 && name.to_ascii_lowercase().ends_with(".pdf")
}

/// Hex SHA-256 of the uploaded bytes, used to correlate uploads in logs.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
