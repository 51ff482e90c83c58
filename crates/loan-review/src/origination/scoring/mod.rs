//! Creditworthiness scores for loan applications.
//!
//! Scores come from a [`ScoreProvider`] that may be offline. [`ScoringClient`] absorbs every
//! provider failure into [`ScoreResult::Unavailable`], so callers never see an outage as an
//! error.

mod model;

pub use model::ReferenceScoringModel;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{ApplicationId, BorrowerId};

/// Upper bound of the score scale.
pub const MAX_SCORE: u16 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreGrade {
    pub fn from_total(total: u16) -> Self {
        match total {
            800.. => Self::Excellent,
            650..=799 => Self::Good,
            500..=649 => Self::Fair,
            _ => Self::Poor,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::Poor => "POOR",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        [Self::Excellent, Self::Good, Self::Fair, Self::Poor]
            .into_iter()
            .find(|grade| grade.label().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for ScoreGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_total(total: u16) -> Self {
        match total {
            750.. => Self::Low,
            550..=749 => Self::Medium,
            _ => Self::High,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        [Self::Low, Self::Medium, Self::High]
            .into_iter()
            .find(|risk| risk.label().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-factor sub-scores, each on the 0..=1000 scale before weighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub employment: u16,
    pub income: u16,
    pub loan_to_value: u16,
    pub debt_to_income: u16,
    pub employment_years: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_term_bonus: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanScore {
    pub application_id: ApplicationId,
    pub borrower_id: BorrowerId,
    pub total_score: u16,
    pub score_grade: ScoreGrade,
    pub risk_assessment: RiskLevel,
    pub score_breakdown: ScoreBreakdown,
    pub calculated_at: DateTime<Utc>,
    pub service_available: bool,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Outcome of a score lookup. An outage is a value, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreResult {
    Available(LoanScore),
    #[serde(rename = "SERVICE_DOWN", rename_all = "camelCase")]
    Unavailable {
        application_id: ApplicationId,
        reason: String,
    },
}

impl ScoreResult {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn score(&self) -> Option<&LoanScore> {
        match self {
            Self::Available(score) => Some(score),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn application_id(&self) -> &ApplicationId {
        match self {
            Self::Available(score) => &score.application_id,
            Self::Unavailable { application_id, .. } => application_id,
        }
    }

    /// Placeholder when no scoring client is attached.
    pub fn disabled(application_id: &ApplicationId) -> Self {
        Self::degraded(application_id, "scoring service is disabled")
    }

    fn degraded(application_id: &ApplicationId, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            application_id: application_id.clone(),
            reason: reason.into(),
        }
    }
}

/// Failure reported by a score provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("scoring service is unavailable")]
    Unavailable,
    #[error("scoring request failed: {0}")]
    Transport(String),
    #[error("no loan application {0} to score")]
    UnknownApplication(ApplicationId),
}

/// Source of computed scores.
#[async_trait]
pub trait ScoreProvider: Send + Sync {
    async fn fetch(&self, application_id: &ApplicationId) -> Result<LoanScore, ScoringError>;

    async fn is_available(&self) -> Result<bool, ScoringError> {
        Ok(true)
    }
}

/// Availability check result handed to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringServiceStatus {
    pub available: bool,
    pub checked_at: DateTime<Utc>,
    pub detail: String,
}

/// Scores keyed by application, as loaded for one view.
pub type ScoreMap = BTreeMap<ApplicationId, ScoreResult>;

/// Outage-absorbing front for a [`ScoreProvider`].
#[derive(Clone)]
pub struct ScoringClient {
    provider: Arc<dyn ScoreProvider>,
}

impl fmt::Debug for ScoringClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringClient").finish_non_exhaustive()
    }
}

impl ScoringClient {
    pub fn new(provider: Arc<dyn ScoreProvider>) -> Self {
        Self { provider }
    }

    /// Fetch one score; any provider error yields [`ScoreResult::Unavailable`].
    pub async fn get_score(&self, application_id: &ApplicationId) -> ScoreResult {
        match self.provider.fetch(application_id).await {
            Ok(score) if score.total_score > MAX_SCORE => {
                warn!(
                    application = %application_id,
                    total = score.total_score,
                    "score outside 0..=1000 discarded"
                );
                ScoreResult::degraded(application_id, "score out of range")
            }
            Ok(score) => ScoreResult::Available(score),
            Err(error) => {
                warn!(application = %application_id, %error, "score unavailable");
                ScoreResult::degraded(application_id, error.to_string())
            }
        }
    }

    /// Fetch all scores concurrently and wait for every one to settle.
    pub async fn list_scores<'a, I>(&self, application_ids: I) -> ScoreMap
    where
        I: IntoIterator<Item = &'a ApplicationId>,
    {
        let fetches = application_ids
            .into_iter()
            .map(|id| async move { (id.clone(), self.get_score(id).await) });
        let scores: ScoreMap = join_all(fetches).await.into_iter().collect();
        debug!(
            loaded = scores.len(),
            degraded = scores.values().filter(|result| !result.is_available()).count(),
            "scores loaded"
        );
        scores
    }

    pub async fn service_status(&self) -> ScoringServiceStatus {
        let (available, detail) = match self.provider.is_available().await {
            Ok(true) => (true, "scoring service is available".to_string()),
            Ok(false) => (false, "scoring service is unavailable".to_string()),
            Err(error) => (false, error.to_string()),
        };
        ScoringServiceStatus {
            available,
            checked_at: Utc::now(),
            detail,
        }
    }
}

/// Scores from `scores` with the given grade; degraded entries never match.
pub fn filter_by_grade(scores: &ScoreMap, grade: ScoreGrade) -> Vec<&LoanScore> {
    scores
        .values()
        .filter_map(ScoreResult::score)
        .filter(|score| score.score_grade == grade)
        .collect()
}

pub fn filter_by_risk(scores: &ScoreMap, risk: RiskLevel) -> Vec<&LoanScore> {
    scores
        .values()
        .filter_map(ScoreResult::score)
        .filter(|score| score.risk_assessment == risk)
        .collect()
}
