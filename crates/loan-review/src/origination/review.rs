//! Officer review session: loaded view, status filter and one pending decision.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{ApplicationId, Document, DocumentId, LoanApplication};
use super::repository::{ApplicationStore, BorrowerStore, DocumentStore};
use super::scoring::{ScoreMap, ScoreResult, ScoringServiceStatus};
use super::service::{DocumentSummary, LifecycleError, LoanOrigination};
use super::status::{DocumentStatus, LifecycleStatus, LoanStatus, ReviewPhase, StatusFilter};

/// Item a pending decision applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionTarget {
    Loan {
        id: ApplicationId,
        status: LoanStatus,
    },
    Document {
        id: DocumentId,
        status: DocumentStatus,
    },
}

impl TransitionTarget {
    fn phase(&self) -> ReviewPhase {
        match self {
            Self::Loan { status, .. } => status.phase(),
            Self::Document { status, .. } => status.phase(),
        }
    }
}

/// Decision opened by the officer but not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionIntent {
    pub target: TransitionTarget,
    pub rejection_reason: Option<String>,
}

impl TransitionIntent {
    pub fn is_rejection(&self) -> bool {
        self.target.phase() == ReviewPhase::Rejected
    }

    pub fn is_committable(&self) -> bool {
        !self.is_rejection()
            || self
                .rejection_reason
                .as_deref()
                .is_some_and(|reason| !reason.trim().is_empty())
    }
}

/// Record returned by a committed decision.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Loan(LoanApplication),
    Document(Document),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReviewError {
    #[error("no transition is pending")]
    NoPendingTransition,
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    /// The decision was stored; only reloading the view failed.
    #[error("decision committed but the review view could not be reloaded: {source}")]
    RefreshAfterCommit {
        outcome: Box<TransitionOutcome>,
        #[source]
        source: LifecycleError,
    },
}

/// Everything loaded by the last successful refresh.
#[derive(Debug, Clone, Default)]
pub struct ReviewView {
    pub applications: Vec<LoanApplication>,
    pub documents: Vec<Document>,
    pub scores: ScoreMap,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Dashboard counters over all loaded applications, ignoring the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub under_review: usize,
    pub approved: usize,
    pub rejected: usize,
}

pub struct ReviewSession<A, B, D> {
    origination: Arc<LoanOrigination<A, B, D>>,
    officer: String,
    view: ReviewView,
    filter: StatusFilter,
    intent: Option<TransitionIntent>,
}

impl<A, B, D> ReviewSession<A, B, D>
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    pub fn new(origination: Arc<LoanOrigination<A, B, D>>, officer: impl Into<String>) -> Self {
        Self {
            origination,
            officer: officer.into(),
            view: ReviewView::default(),
            filter: StatusFilter::All,
            intent: None,
        }
    }

    pub fn officer(&self) -> &str {
        &self.officer
    }

    pub fn view(&self) -> &ReviewView {
        &self.view
    }

    /// Reload applications and documents together, then their scores.
    ///
    /// The previous view is kept when any store call fails.
    pub async fn refresh(&mut self) -> Result<(), LifecycleError> {
        let loaded = self.load().await;
        match loaded {
            Ok(view) => {
                self.view = view;
                Ok(())
            }
            Err(error) => {
                warn!(
                    officer = %self.officer,
                    %error,
                    "review refresh failed; keeping previous view"
                );
                Err(error)
            }
        }
    }

    async fn load(&self) -> Result<ReviewView, LifecycleError> {
        let (applications, documents) = tokio::try_join!(
            self.origination.loans().list(None),
            self.origination.documents().list_all(None),
        )?;

        let scores = match self.origination.scoring() {
            Some(client) => client.list_scores(applications.iter().map(|app| &app.id)).await,
            None => ScoreMap::new(),
        };

        Ok(ReviewView {
            applications,
            documents,
            scores,
            loaded_at: Some(Utc::now()),
        })
    }

    /// Open a decision, replacing any previous one.
    pub fn request_transition(&mut self, target: TransitionTarget) {
        self.intent = Some(TransitionIntent {
            target,
            rejection_reason: None,
        });
    }

    pub fn set_rejection_reason(&mut self, reason: impl Into<String>) -> Result<(), ReviewError> {
        let intent = self.intent.as_mut().ok_or(ReviewError::NoPendingTransition)?;
        intent.rejection_reason = Some(reason.into());
        Ok(())
    }

    pub fn cancel_transition(&mut self) {
        self.intent = None;
    }

    pub fn pending_transition(&self) -> Option<&TransitionIntent> {
        self.intent.as_ref()
    }

    pub fn is_committable(&self) -> bool {
        self.intent
            .as_ref()
            .is_some_and(TransitionIntent::is_committable)
    }

    /// Apply the pending decision and reload the view.
    ///
    /// A rejected lifecycle call leaves both the view and the intent untouched. Once the
    /// decision is stored the intent is cleared even if the follow-up refresh fails.
    pub async fn commit_transition(&mut self) -> Result<TransitionOutcome, ReviewError> {
        let intent = self.intent.as_ref().ok_or(ReviewError::NoPendingTransition)?;
        let reason = intent.rejection_reason.as_deref();

        let outcome = match &intent.target {
            TransitionTarget::Loan { id, status } => TransitionOutcome::Loan(
                self.origination
                    .loans()
                    .transition(id, *status, &self.officer, reason)
                    .await?,
            ),
            TransitionTarget::Document { id, status } => TransitionOutcome::Document(
                self.origination
                    .documents()
                    .transition(id, *status, &self.officer, reason)
                    .await?,
            ),
        };

        info!(officer = %self.officer, "review decision committed");
        self.intent = None;
        match self.refresh().await {
            Ok(()) => Ok(outcome),
            Err(source) => Err(ReviewError::RefreshAfterCommit {
                outcome: Box::new(outcome),
                source,
            }),
        }
    }

    pub fn filter_by_status(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn visible_applications(&self) -> Vec<&LoanApplication> {
        self.view
            .applications
            .iter()
            .filter(|app| self.filter.matches(app.status))
            .collect()
    }

    pub fn visible_documents(&self) -> Vec<&Document> {
        self.view
            .documents
            .iter()
            .filter(|doc| self.filter.matches(doc.status))
            .collect()
    }

    pub fn score_for(&self, application_id: &ApplicationId) -> Option<&ScoreResult> {
        self.view.scores.get(application_id)
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for app in &self.view.applications {
            counts.total += 1;
            match app.status {
                LoanStatus::Pending => counts.pending += 1,
                LoanStatus::UnderReview => counts.under_review += 1,
                LoanStatus::Approved => counts.approved += 1,
                LoanStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }

    /// Summary of the loaded documents attached to one application.
    pub fn document_summary(&self, application_id: &ApplicationId) -> DocumentSummary {
        DocumentSummary::from_documents(
            self.view
                .documents
                .iter()
                .filter(|doc| doc.loan_application_id.as_ref() == Some(application_id)),
            self.origination.policy().required_document_types(),
        )
    }

    /// `None` when scoring is not wired in.
    pub async fn service_status(&self) -> Option<ScoringServiceStatus> {
        match self.origination.scoring() {
            Some(client) => Some(client.service_status().await),
            None => None,
        }
    }
}
