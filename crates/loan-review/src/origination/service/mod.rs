mod borrowers;
mod documents;
mod loans;

pub use borrowers::{BorrowerService, EnsuredProfile};
pub use documents::{DocumentService, DocumentSummary};
pub use loans::LoanApplicationService;

use std::cmp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::intake::{IntakeGuard, IntakePolicy, ValidationError};
use super::payment::{PaymentQuote, PaymentQuoteRequest};
use super::repository::{
    ApplicationStore, BorrowerStore, DocumentStore, RepositoryError, StatusUpdate,
};
use super::scoring::ScoringClient;
use super::status::{
    check_transition, IllegalTransition, LifecycleStatus, ReviewPhase, TransitionCheck,
};

/// Error raised by the lifecycle services.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{entity} {id} was updated concurrently; reload before deciding again")]
    StaleStatus { entity: &'static str, id: String },
    #[error("store failure: {0}")]
    Store(RepositoryError),
}

impl LifecycleError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Attach entity context to a store error.
    pub(crate) fn from_store(
        entity: &'static str,
        id: impl ToString,
        error: RepositoryError,
    ) -> Self {
        match error {
            RepositoryError::NotFound => Self::not_found(entity, id),
            RepositoryError::Stale => Self::StaleStatus {
                entity,
                id: id.to_string(),
            },
            other => Self::Store(other),
        }
    }
}

impl From<RepositoryError> for LifecycleError {
    fn from(value: RepositoryError) -> Self {
        Self::Store(value)
    }
}

static BORROWER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id(sequence: &AtomicU64, prefix: &str) -> String {
    let id = sequence.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

/// Minted ids ordered by sequence number; a wider id was minted later.
pub(crate) fn sequence_order(a: &str, b: &str) -> cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

pub(crate) fn next_borrower_id() -> String {
    next_id(&BORROWER_SEQUENCE, "bor")
}

pub(crate) fn next_application_id() -> String {
    next_id(&APPLICATION_SEQUENCE, "loan")
}

pub(crate) fn next_document_id() -> String {
    next_id(&DOCUMENT_SEQUENCE, "doc")
}

/// Officer decision validated up front, before the current record is read.
pub(crate) struct Decision<S> {
    target: S,
    actor: String,
    rejection_reason: Option<String>,
}

impl<S: LifecycleStatus> Decision<S> {
    pub(crate) fn new(
        guard: &IntakeGuard,
        target: S,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let rejection_reason =
            guard.rejection_reason(target.phase() == ReviewPhase::Rejected, reason)?;
        let actor = guard.actor(actor)?;
        Ok(Self {
            target,
            actor,
            rejection_reason,
        })
    }

    /// Resolve against the stored status; `None` means the transition is an accepted no-op.
    pub(crate) fn against(
        self,
        current: S,
    ) -> Result<Option<StatusUpdate<S>>, IllegalTransition> {
        match check_transition(current, self.target)? {
            TransitionCheck::NoOp => Ok(None),
            TransitionCheck::Apply => Ok(Some(StatusUpdate {
                expected: current,
                status: self.target,
                updated_by: self.actor,
                updated_at: Utc::now(),
                rejection_reason: self.rejection_reason,
            })),
        }
    }
}

/// The three lifecycle services wired over one set of stores, plus optional scoring.
pub struct LoanOrigination<A, B, D> {
    guard: Arc<IntakeGuard>,
    borrowers: BorrowerService<B>,
    loans: LoanApplicationService<A, B>,
    documents: DocumentService<D, A, B>,
    scoring: Option<ScoringClient>,
}

impl<A, B, D> LoanOrigination<A, B, D>
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    pub fn new(
        applications: Arc<A>,
        borrowers: Arc<B>,
        documents: Arc<D>,
        policy: IntakePolicy,
    ) -> Self {
        let guard = Arc::new(IntakeGuard::with_policy(policy));

        Self {
            borrowers: BorrowerService::new(borrowers.clone(), guard.clone()),
            loans: LoanApplicationService::new(
                applications.clone(),
                borrowers.clone(),
                guard.clone(),
            ),
            documents: DocumentService::new(documents, applications, borrowers, guard.clone()),
            guard,
            scoring: None,
        }
    }

    pub fn with_scoring(mut self, client: ScoringClient) -> Self {
        self.scoring = Some(client);
        self
    }

    pub fn policy(&self) -> &IntakePolicy {
        self.guard.policy()
    }

    pub fn borrowers(&self) -> &BorrowerService<B> {
        &self.borrowers
    }

    pub fn loans(&self) -> &LoanApplicationService<A, B> {
        &self.loans
    }

    pub fn documents(&self) -> &DocumentService<D, A, B> {
        &self.documents
    }

    pub fn scoring(&self) -> Option<&ScoringClient> {
        self.scoring.as_ref()
    }

    /// Repayment projection for a prospective loan; nothing is stored.
    pub fn quote(&self, request: &PaymentQuoteRequest) -> Result<PaymentQuote, LifecycleError> {
        self.guard.check_quote(request)?;
        Ok(PaymentQuote::calculate(request))
    }
}
