use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// A single ranked candidate as returned by the Match Orchestrator and
/// persisted inside an analysis record.
///
/// Ranks are 1-based and dense; scores are non-increasing in rank order,
/// with ties kept in the model's own ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub rank: u32,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Match score, 0–100.
    pub score: u8,
    /// Human-readable rationale, in the model's own ordering.
    pub reasons: Vec<String>,
}

/// One completed analysis. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_description_filename: String,
    pub resume_filenames: Vec<String>,
    pub total_resumes: i32,
    pub candidates: Json<Vec<CandidateResult>>,
    pub no_match: bool,
    /// Resumes dropped because text extraction failed (skip-and-report).
    pub skipped_files: Vec<String>,
    pub created_at: DateTime<Utc>,
}
