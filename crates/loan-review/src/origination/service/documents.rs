use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::{next_document_id, sequence_order, Decision, LifecycleError};
use crate::origination::domain::{
    ApplicationId, BorrowerId, Document, DocumentId, DocumentType, DocumentUpload,
};
use crate::origination::intake::{IntakeGuard, ValidationError};
use crate::origination::repository::{ApplicationStore, BorrowerStore, DocumentStore};
use crate::origination::status::{DocumentStatus, LifecycleStatus, LoanStatus};

const ENTITY: &str = DocumentStatus::ENTITY;

/// Upload and verification of supporting documents.
pub struct DocumentService<D, A, B> {
    guard: Arc<IntakeGuard>,
    documents: Arc<D>,
    applications: Arc<A>,
    borrowers: Arc<B>,
}

impl<D, A, B> DocumentService<D, A, B>
where
    D: DocumentStore + 'static,
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
{
    pub fn new(
        documents: Arc<D>,
        applications: Arc<A>,
        borrowers: Arc<B>,
        guard: Arc<IntakeGuard>,
    ) -> Self {
        Self {
            guard,
            documents,
            applications,
            borrowers,
        }
    }

    /// Record an uploaded file's metadata in `PENDING`.
    ///
    /// When the upload names a loan application, that application must exist and belong to
    /// the same borrower.
    pub async fn upload(
        &self,
        borrower_id: &BorrowerId,
        upload: DocumentUpload,
    ) -> Result<Document, LifecycleError> {
        let content_type = self.guard.check_upload(&upload)?;

        self.borrowers
            .get(borrower_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("borrower", borrower_id))?;

        if let Some(application_id) = &upload.loan_application_id {
            let application = self
                .applications
                .get(application_id)
                .await?
                .ok_or_else(|| LifecycleError::not_found(LoanStatus::ENTITY, application_id))?;
            if &application.borrower_id != borrower_id {
                return Err(ValidationError::ApplicationBorrowerMismatch {
                    application: application_id.to_string(),
                }
                .into());
            }
        }

        let file_name = upload.file.file_name.trim().to_string();
        let document_name = upload
            .document_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| file_name.clone());

        let record = Document {
            id: DocumentId(next_document_id()),
            borrower_id: borrower_id.clone(),
            loan_application_id: upload.loan_application_id,
            document_type: upload.document_type,
            document_name,
            description: upload.description.filter(|text| !text.trim().is_empty()),
            file_name,
            file_size: upload.file.file_size,
            content_type,
            status: DocumentStatus::initial(),
            status_updated_by: None,
            status_updated_at: None,
            rejection_reason: None,
            uploaded_at: Utc::now(),
        };

        let stored = self.documents.insert(record).await?;
        info!(
            document = %stored.id,
            borrower = %stored.borrower_id,
            kind = stored.document_type.label(),
            bytes = stored.file_size,
            "document uploaded"
        );
        Ok(stored)
    }

    /// Same contract as the loan transition, with `VERIFIED` as the accepting status.
    pub async fn transition(
        &self,
        document_id: &DocumentId,
        new_status: DocumentStatus,
        actor: &str,
        rejection_reason: Option<&str>,
    ) -> Result<Document, LifecycleError> {
        let decision = Decision::new(&self.guard, new_status, actor, rejection_reason)?;
        let current = self.get(document_id).await?;

        let Some(update) = decision.against(current.status)? else {
            debug!(document = %document_id, status = %current.status, "status re-entry ignored");
            return Ok(current);
        };

        let updated = self
            .documents
            .set_status(document_id, update)
            .await
            .map_err(|err| LifecycleError::from_store(ENTITY, document_id, err))?;

        info!(
            document = %document_id,
            from = %current.status,
            to = %updated.status,
            "document status updated"
        );
        Ok(updated)
    }

    pub async fn get(&self, document_id: &DocumentId) -> Result<Document, LifecycleError> {
        self.documents
            .get(document_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(ENTITY, document_id))
    }

    pub async fn list_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<Document>, LifecycleError> {
        let mut records = self.documents.list_for_application(application_id).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    pub async fn list_for_borrower(
        &self,
        borrower_id: &BorrowerId,
    ) -> Result<Vec<Document>, LifecycleError> {
        let mut records = self.documents.list_for_borrower(borrower_id).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    pub async fn list_all(
        &self,
        filter: Option<DocumentStatus>,
    ) -> Result<Vec<Document>, LifecycleError> {
        let mut records = self.documents.list(filter).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Document counts and completeness for one application.
    pub async fn summary_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<DocumentSummary, LifecycleError> {
        let records = self.documents.list_for_application(application_id).await?;
        Ok(DocumentSummary::from_documents(
            &records,
            self.guard.policy().required_document_types(),
        ))
    }
}

fn sort_newest_first(records: &mut [Document]) {
    records.sort_by(|a, b| {
        b.uploaded_at
            .cmp(&a.uploaded_at)
            .then_with(|| sequence_order(&b.id.0, &a.id.0))
    });
}

/// Status counts for an application's documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub total: usize,
    pub pending: usize,
    pub under_review: usize,
    pub verified: usize,
    pub rejected: usize,
    /// Required types with no verified document yet.
    pub missing_required: Vec<DocumentType>,
}

impl DocumentSummary {
    pub fn from_documents<'a, I>(documents: I, required: &[DocumentType]) -> Self
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut summary = Self::default();
        let mut verified_types = BTreeSet::new();

        for document in documents {
            summary.total += 1;
            match document.status {
                DocumentStatus::Pending => summary.pending += 1,
                DocumentStatus::UnderReview => summary.under_review += 1,
                DocumentStatus::Verified => {
                    summary.verified += 1;
                    verified_types.insert(document.document_type);
                }
                DocumentStatus::Rejected => summary.rejected += 1,
            }
        }

        let mut missing: Vec<DocumentType> = required
            .iter()
            .copied()
            .filter(|kind| !verified_types.contains(kind))
            .collect();
        missing.sort();
        missing.dedup();
        summary.missing_required = missing;
        summary
    }

    /// Every document decided and every required type verified at least once.
    ///
    /// Advisory only: officers may approve an application whose documents are incomplete.
    pub fn is_complete(&self) -> bool {
        self.pending == 0 && self.under_review == 0 && self.missing_required.is_empty()
    }
}
