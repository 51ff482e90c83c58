use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{
    ApplicationId, BorrowerId, BorrowerProfile, Document, DocumentId, LoanApplication,
};
use super::status::{DocumentStatus, LoanStatus};

/// Status write applied by a store.
///
/// `expected` is the status the lifecycle validated the transition against. Stores must
/// refuse the write with [`RepositoryError::Stale`] when the stored status differs, so
/// two officers deciding the same item cannot silently overwrite each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate<S> {
    pub expected: S,
    pub status: S,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
    pub rejection_reason: Option<String>,
}

/// Borrower profile storage.
#[async_trait]
pub trait BorrowerStore: Send + Sync {
    async fn insert(&self, profile: BorrowerProfile) -> Result<BorrowerProfile, RepositoryError>;
    async fn get(&self, id: &BorrowerId) -> Result<Option<BorrowerProfile>, RepositoryError>;
    async fn find_by_user(&self, user_id: &str)
        -> Result<Option<BorrowerProfile>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<BorrowerProfile>, RepositoryError>;
}

/// Loan application storage.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn insert(&self, record: LoanApplication) -> Result<LoanApplication, RepositoryError>;
    async fn get(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError>;
    async fn list(&self, filter: Option<LoanStatus>)
        -> Result<Vec<LoanApplication>, RepositoryError>;
    async fn list_for_borrower(
        &self,
        borrower_id: &BorrowerId,
    ) -> Result<Vec<LoanApplication>, RepositoryError>;
    async fn set_status(
        &self,
        id: &ApplicationId,
        update: StatusUpdate<LoanStatus>,
    ) -> Result<LoanApplication, RepositoryError>;
}

/// Document metadata storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, record: Document) -> Result<Document, RepositoryError>;
    async fn get(&self, id: &DocumentId) -> Result<Option<Document>, RepositoryError>;
    async fn list(&self, filter: Option<DocumentStatus>) -> Result<Vec<Document>, RepositoryError>;
    async fn list_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<Document>, RepositoryError>;
    async fn list_for_borrower(
        &self,
        borrower_id: &BorrowerId,
    ) -> Result<Vec<Document>, RepositoryError>;
    async fn set_status(
        &self,
        id: &DocumentId,
        update: StatusUpdate<DocumentStatus>,
    ) -> Result<Document, RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record changed since it was read")]
    Stale,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
