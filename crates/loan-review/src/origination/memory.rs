//! In-memory store implementations backing the demo, the HTTP service and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::config::ReviewConfig;

use super::domain::{
    ApplicationId, BorrowerId, BorrowerProfile, Document, DocumentId, LoanApplication,
};
use super::intake::IntakePolicy;
use super::repository::{
    ApplicationStore, BorrowerStore, DocumentStore, RepositoryError, StatusUpdate,
};
use super::scoring::{ReferenceScoringModel, ScoringClient};
use super::status::{DocumentStatus, LifecycleStatus, LoanStatus, ReviewPhase};
use super::MemoryOrigination;

/// Build origination over fresh in-memory stores, scored by the reference model when enabled.
pub fn memory_origination(config: &ReviewConfig) -> MemoryOrigination {
    let applications = Arc::new(MemoryApplicationStore::default());
    let borrowers = Arc::new(MemoryBorrowerStore::default());
    let documents = Arc::new(MemoryDocumentStore::default());

    let origination = MemoryOrigination::new(
        applications.clone(),
        borrowers.clone(),
        documents,
        IntakePolicy::from(config),
    );
    if config.scoring_enabled {
        let model = ReferenceScoringModel::new(applications, borrowers);
        origination.with_scoring(ScoringClient::new(Arc::new(model)))
    } else {
        origination
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
}

fn kept_reason<S: LifecycleStatus>(update: &StatusUpdate<S>) -> Option<String> {
    if update.status.phase() == ReviewPhase::Rejected {
        update.rejection_reason.clone()
    } else {
        None
    }
}

#[derive(Debug, Default)]
pub struct MemoryBorrowerStore {
    records: Mutex<HashMap<BorrowerId, BorrowerProfile>>,
}

#[async_trait]
impl BorrowerStore for MemoryBorrowerStore {
    async fn insert(&self, profile: BorrowerProfile) -> Result<BorrowerProfile, RepositoryError> {
        let mut records = lock(&self.records)?;
        let duplicate = records.values().any(|existing| {
            existing.id == profile.id
                || existing.user_id == profile.user_id
                || existing.email.eq_ignore_ascii_case(&profile.email)
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        records.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    async fn get(&self, id: &BorrowerId) -> Result<Option<BorrowerProfile>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    async fn find_by_user(
        &self,
        user_id: &str,
    ) -> Result<Option<BorrowerProfile>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|profile| profile.user_id == user_id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<BorrowerProfile>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|profile| profile.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[derive(Debug, Default)]
pub struct MemoryApplicationStore {
    records: Mutex<HashMap<ApplicationId, LoanApplication>>,
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn insert(&self, record: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        let mut records = lock(&self.records)?;
        if records.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    async fn list(
        &self,
        filter: Option<LoanStatus>,
    ) -> Result<Vec<LoanApplication>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| filter.map_or(true, |status| record.status == status))
            .cloned()
            .collect())
    }

    async fn list_for_borrower(
        &self,
        borrower_id: &BorrowerId,
    ) -> Result<Vec<LoanApplication>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| &record.borrower_id == borrower_id)
            .cloned()
            .collect())
    }

    async fn set_status(
        &self,
        id: &ApplicationId,
        update: StatusUpdate<LoanStatus>,
    ) -> Result<LoanApplication, RepositoryError> {
        let mut records = lock(&self.records)?;
        let record = records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if record.status != update.expected {
            return Err(RepositoryError::Stale);
        }
        record.rejection_reason = kept_reason(&update);
        record.status = update.status;
        record.status_updated_by = Some(update.updated_by);
        record.status_updated_at = Some(update.updated_at);
        Ok(record.clone())
    }
}

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    records: Mutex<HashMap<DocumentId, Document>>,
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, record: Document) -> Result<Document, RepositoryError> {
        let mut records = lock(&self.records)?;
        if records.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<Document>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    async fn list(&self, filter: Option<DocumentStatus>) -> Result<Vec<Document>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| filter.map_or(true, |status| record.status == status))
            .cloned()
            .collect())
    }

    async fn list_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<Document>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| record.loan_application_id.as_ref() == Some(application_id))
            .cloned()
            .collect())
    }

    async fn list_for_borrower(
        &self,
        borrower_id: &BorrowerId,
    ) -> Result<Vec<Document>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| &record.borrower_id == borrower_id)
            .cloned()
            .collect())
    }

    async fn set_status(
        &self,
        id: &DocumentId,
        update: StatusUpdate<DocumentStatus>,
    ) -> Result<Document, RepositoryError> {
        let mut records = lock(&self.records)?;
        let record = records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if record.status != update.expected {
            return Err(RepositoryError::Stale);
        }
        record.rejection_reason = kept_reason(&update);
        record.status = update.status;
        record.status_updated_by = Some(update.updated_by);
        record.status_updated_at = Some(update.updated_at);
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origination::domain::{EmploymentStatus, LoanType};
    use chrono::Utc;

    fn application(id: &str) -> LoanApplication {
        LoanApplication {
            id: ApplicationId(id.to_string()),
            borrower_id: BorrowerId("bor-mem".to_string()),
            loan_type: LoanType::Auto,
            loan_amount: 18_000.0,
            loan_term_months: 48,
            interest_rate: 7.2,
            purpose: "vehicle".to_string(),
            status: LoanStatus::Pending,
            status_updated_by: None,
            status_updated_at: None,
            rejection_reason: None,
            applied_at: Utc::now(),
        }
    }

    fn update(
        expected: LoanStatus,
        status: LoanStatus,
        reason: Option<&str>,
    ) -> StatusUpdate<LoanStatus> {
        StatusUpdate {
            expected,
            status,
            updated_by: "officer.mem".to_string(),
            updated_at: Utc::now(),
            rejection_reason: reason.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn set_status_rejects_stale_expectation() {
        let store = MemoryApplicationStore::default();
        let id = store.insert(application("loan-mem-1")).await.expect("insert").id;

        store
            .set_status(&id, update(LoanStatus::Pending, LoanStatus::UnderReview, None))
            .await
            .expect("first writer");
        let second = store
            .set_status(&id, update(LoanStatus::Pending, LoanStatus::Approved, None))
            .await;

        assert_eq!(second, Err(RepositoryError::Stale));
        let stored = store.get(&id).await.expect("get").expect("present");
        assert_eq!(stored.status, LoanStatus::UnderReview);
    }

    #[tokio::test]
    async fn reason_survives_only_on_rejection() {
        let store = MemoryApplicationStore::default();
        let id = store.insert(application("loan-mem-2")).await.expect("insert").id;

        let approved = store
            .set_status(
                &id,
                update(LoanStatus::Pending, LoanStatus::Approved, Some("ignored")),
            )
            .await
            .expect("approved");

        assert_eq!(approved.rejection_reason, None);
        assert_eq!(approved.status_updated_by.as_deref(), Some("officer.mem"));
    }

    #[tokio::test]
    async fn unknown_record_and_duplicate_insert() {
        let store = MemoryApplicationStore::default();
        store.insert(application("loan-mem-3")).await.expect("insert");

        assert_eq!(
            store.insert(application("loan-mem-3")).await,
            Err(RepositoryError::Conflict)
        );
        assert_eq!(
            store
                .set_status(
                    &ApplicationId("loan-absent".to_string()),
                    update(LoanStatus::Pending, LoanStatus::Approved, None),
                )
                .await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn borrower_email_lookup_ignores_case() {
        let store = MemoryBorrowerStore::default();
        let profile = BorrowerProfile {
            id: BorrowerId("bor-mem-1".to_string()),
            user_id: "user-mem".to_string(),
            first_name: "Rowan".to_string(),
            last_name: "Hale".to_string(),
            email: "rowan.hale@example.com".to_string(),
            phone_number: None,
            date_of_birth: None,
            address: None,
            annual_income: 61_000.0,
            employment_status: EmploymentStatus::SelfEmployed,
            employer_name: None,
            employment_years: 3,
            created_at: Utc::now(),
        };
        store.insert(profile.clone()).await.expect("insert");

        let found = store
            .find_by_email("Rowan.Hale@Example.com")
            .await
            .expect("lookup");
        assert_eq!(found.map(|p| p.id), Some(profile.id.clone()));

        let mut twin = profile;
        twin.id = BorrowerId("bor-mem-2".to_string());
        twin.user_id = "user-twin".to_string();
        twin.email = "ROWAN.HALE@example.com".to_string();
        assert_eq!(store.insert(twin).await, Err(RepositoryError::Conflict));
    }
}
