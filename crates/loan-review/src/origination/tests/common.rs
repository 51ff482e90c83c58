use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Barrier;

use crate::origination::domain::{
    ApplicationId, BorrowerDraft, BorrowerId, BorrowerProfile, DocumentType, DocumentUpload,
    EmploymentStatus, FileMeta, LoanApplication, LoanRequest, LoanType,
};
use crate::origination::memory::{
    MemoryApplicationStore, MemoryBorrowerStore, MemoryDocumentStore,
};
use crate::origination::repository::{
    ApplicationStore, BorrowerStore, DocumentStore, RepositoryError, StatusUpdate,
};
use crate::origination::scoring::{
    LoanScore, RiskLevel, ScoreBreakdown, ScoreGrade, ScoreProvider, ScoringError,
};
use crate::origination::status::LoanStatus;
use crate::origination::{IntakePolicy, LoanOrigination, MemoryOrigination};

pub(super) fn borrower_draft(suffix: &str) -> BorrowerDraft {
    BorrowerDraft {
        user_id: format!("user-{suffix}"),
        first_name: "Dana".to_string(),
        last_name: "Whitfield".to_string(),
        email: format!("dana.{suffix}@example.com"),
        phone_number: Some("555-0142".to_string()),
        date_of_birth: None,
        address: None,
        annual_income: 90_000.0,
        employment_status: EmploymentStatus::Employed,
        employer_name: Some("Northwind Logistics".to_string()),
        employment_years: 6,
    }
}

pub(super) fn loan_request(amount: f64) -> LoanRequest {
    LoanRequest {
        loan_type: LoanType::Personal,
        loan_amount: amount,
        loan_term_months: 36,
        interest_rate: 6.5,
        purpose: "debt consolidation".to_string(),
    }
}

pub(super) fn upload(
    document_type: DocumentType,
    file_name: &str,
    application: Option<&ApplicationId>,
) -> DocumentUpload {
    DocumentUpload {
        loan_application_id: application.cloned(),
        document_type,
        document_name: None,
        description: None,
        file: FileMeta {
            file_name: file_name.to_string(),
            file_size: 240_000,
        },
    }
}

pub(super) struct Stores {
    pub(super) applications: Arc<MemoryApplicationStore>,
    pub(super) borrowers: Arc<MemoryBorrowerStore>,
    pub(super) documents: Arc<MemoryDocumentStore>,
}

pub(super) fn stores() -> Stores {
    Stores {
        applications: Arc::new(MemoryApplicationStore::default()),
        borrowers: Arc::new(MemoryBorrowerStore::default()),
        documents: Arc::new(MemoryDocumentStore::default()),
    }
}

pub(super) fn build_origination() -> (MemoryOrigination, Stores) {
    let stores = stores();
    let origination = LoanOrigination::new(
        stores.applications.clone(),
        stores.borrowers.clone(),
        stores.documents.clone(),
        IntakePolicy::default(),
    );
    (origination, stores)
}

/// Borrower plus one pending application of 50,000.
pub(super) async fn seed<A, B, D>(
    origination: &LoanOrigination<A, B, D>,
    suffix: &str,
) -> (BorrowerProfile, LoanApplication)
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let borrower = origination
        .borrowers()
        .ensure_profile(borrower_draft(suffix))
        .await
        .expect("profile created");
    let application = origination
        .loans()
        .submit(&borrower.id, loan_request(50_000.0))
        .await
        .expect("application submitted");
    (borrower, application)
}

pub(super) fn score_for(application_id: &ApplicationId, total_score: u16) -> LoanScore {
    LoanScore {
        application_id: application_id.clone(),
        borrower_id: BorrowerId("bor-fixture".to_string()),
        total_score,
        score_grade: ScoreGrade::from_total(total_score),
        risk_assessment: RiskLevel::from_total(total_score),
        score_breakdown: ScoreBreakdown {
            employment: 1000,
            income: 700,
            loan_to_value: 600,
            debt_to_income: 800,
            employment_years: 500,
            loan_term_bonus: None,
        },
        calculated_at: Utc::now(),
        service_available: true,
        notes: Vec::new(),
    }
}

/// Provider that scores every application except the ones listed as failing.
#[derive(Default)]
pub(super) struct ScriptedScores {
    pub(super) failing: HashSet<ApplicationId>,
    pub(super) total_score: u16,
}

impl ScriptedScores {
    pub(super) fn scoring(total_score: u16) -> Self {
        Self {
            failing: HashSet::new(),
            total_score,
        }
    }

    pub(super) fn failing_for(mut self, id: &ApplicationId) -> Self {
        self.failing.insert(id.clone());
        self
    }
}

#[async_trait]
impl ScoreProvider for ScriptedScores {
    async fn fetch(&self, application_id: &ApplicationId) -> Result<LoanScore, ScoringError> {
        if self.failing.contains(application_id) {
            return Err(ScoringError::Transport("connection reset".to_string()));
        }
        Ok(score_for(application_id, self.total_score))
    }
}

/// Provider that answers only once `parties` fetches are in flight at the same time.
pub(super) struct GatedScores {
    gate: Barrier,
    failing: ApplicationId,
    total_score: u16,
}

impl GatedScores {
    pub(super) fn new(parties: usize, failing: &ApplicationId, total_score: u16) -> Self {
        Self {
            gate: Barrier::new(parties),
            failing: failing.clone(),
            total_score,
        }
    }
}

#[async_trait]
impl ScoreProvider for GatedScores {
    async fn fetch(&self, application_id: &ApplicationId) -> Result<LoanScore, ScoringError> {
        self.gate.wait().await;
        if *application_id == self.failing {
            return Err(ScoringError::Transport("connection reset".to_string()));
        }
        Ok(score_for(application_id, self.total_score))
    }
}

/// Provider whose every call fails, including the availability check.
pub(super) struct DownScores;

#[async_trait]
impl ScoreProvider for DownScores {
    async fn fetch(&self, _application_id: &ApplicationId) -> Result<LoanScore, ScoringError> {
        Err(ScoringError::Unavailable)
    }

    async fn is_available(&self) -> Result<bool, ScoringError> {
        Err(ScoringError::Transport("health check timed out".to_string()))
    }
}

/// Application store that can be switched offline after seeding.
#[derive(Default)]
pub(super) struct FlakyApplicationStore {
    pub(super) inner: MemoryApplicationStore,
    pub(super) offline: AtomicBool,
}

impl FlakyApplicationStore {
    pub(super) fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("database offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ApplicationStore for FlakyApplicationStore {
    async fn insert(&self, record: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        self.check()?;
        self.inner.insert(record).await
    }

    async fn get(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        self.check()?;
        self.inner.get(id).await
    }

    async fn list(
        &self,
        filter: Option<LoanStatus>,
    ) -> Result<Vec<LoanApplication>, RepositoryError> {
        self.check()?;
        self.inner.list(filter).await
    }

    async fn list_for_borrower(
        &self,
        borrower_id: &BorrowerId,
    ) -> Result<Vec<LoanApplication>, RepositoryError> {
        self.check()?;
        self.inner.list_for_borrower(borrower_id).await
    }

    async fn set_status(
        &self,
        id: &ApplicationId,
        update: StatusUpdate<LoanStatus>,
    ) -> Result<LoanApplication, RepositoryError> {
        self.check()?;
        self.inner.set_status(id, update).await
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
