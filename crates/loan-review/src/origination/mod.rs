//! Loan application and document review.
//!
//! Borrowers submit applications and supporting documents; officers move both through the
//! shared review graph in [`status`], assisted by an optional score from [`scoring`].

pub mod domain;
pub mod intake;
pub mod memory;
pub mod payment;
pub mod repository;
pub mod review;
pub mod router;
pub mod scoring;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, BorrowerDraft, BorrowerId, BorrowerProfile, Document, DocumentId, DocumentType,
    DocumentUpload, EmploymentStatus, FileMeta, LoanApplication, LoanApplicationView, LoanRequest,
    LoanType, PostalAddress,
};
pub use intake::{IntakeGuard, IntakePolicy, ValidationError};
pub use memory::{
    memory_origination, MemoryApplicationStore, MemoryBorrowerStore, MemoryDocumentStore,
};
pub use payment::{PaymentQuote, PaymentQuoteRequest};
pub use repository::{
    ApplicationStore, BorrowerStore, DocumentStore, RepositoryError, StatusUpdate,
};
pub use review::{
    ReviewError, ReviewSession, ReviewView, StatusCounts, TransitionIntent, TransitionOutcome,
    TransitionTarget,
};
pub use router::origination_router;
pub use scoring::{
    LoanScore, ReferenceScoringModel, RiskLevel, ScoreGrade, ScoreMap, ScoreProvider,
    ScoreResult, ScoringClient, ScoringError, ScoringServiceStatus,
};
pub use service::{
    BorrowerService, DocumentService, DocumentSummary, EnsuredProfile, LifecycleError,
    LoanApplicationService, LoanOrigination,
};
pub use status::{
    DocumentStatus, IllegalTransition, LifecycleStatus, LoanStatus, ReviewPhase, StatusFilter,
};

/// Origination wired over the in-memory stores.
pub type MemoryOrigination =
    LoanOrigination<MemoryApplicationStore, MemoryBorrowerStore, MemoryDocumentStore>;
