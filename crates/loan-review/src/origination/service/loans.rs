use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::{next_application_id, sequence_order, Decision, LifecycleError};
use crate::origination::domain::{ApplicationId, BorrowerId, LoanApplication, LoanRequest};
use crate::origination::intake::IntakeGuard;
use crate::origination::repository::{ApplicationStore, BorrowerStore};
use crate::origination::status::{LifecycleStatus, LoanStatus};

const ENTITY: &str = LoanStatus::ENTITY;

/// Submission and decisioning for loan applications.
pub struct LoanApplicationService<A, B> {
    guard: Arc<IntakeGuard>,
    applications: Arc<A>,
    borrowers: Arc<B>,
}

impl<A, B> LoanApplicationService<A, B>
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
{
    pub fn new(applications: Arc<A>, borrowers: Arc<B>, guard: Arc<IntakeGuard>) -> Self {
        Self {
            guard,
            applications,
            borrowers,
        }
    }

    /// Validate and store a new application in `PENDING`.
    pub async fn submit(
        &self,
        borrower_id: &BorrowerId,
        request: LoanRequest,
    ) -> Result<LoanApplication, LifecycleError> {
        self.guard.check_loan_request(&request)?;

        self.borrowers
            .get(borrower_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("borrower", borrower_id))?;

        let record = LoanApplication {
            id: ApplicationId(next_application_id()),
            borrower_id: borrower_id.clone(),
            loan_type: request.loan_type,
            loan_amount: request.loan_amount,
            loan_term_months: request.loan_term_months,
            interest_rate: request.interest_rate,
            purpose: request.purpose.trim().to_string(),
            status: LoanStatus::initial(),
            status_updated_by: None,
            status_updated_at: None,
            rejection_reason: None,
            applied_at: Utc::now(),
        };

        let stored = self.applications.insert(record).await?;
        info!(
            application = %stored.id,
            borrower = %stored.borrower_id,
            amount = stored.loan_amount,
            term = stored.loan_term_months,
            "loan application submitted"
        );
        Ok(stored)
    }

    /// Move an application along the review graph.
    ///
    /// The rejection reason is checked before the store is consulted. Moving an application
    /// that is already `UNDER_REVIEW` to `UNDER_REVIEW` returns it untouched.
    pub async fn transition(
        &self,
        application_id: &ApplicationId,
        new_status: LoanStatus,
        actor: &str,
        rejection_reason: Option<&str>,
    ) -> Result<LoanApplication, LifecycleError> {
        let decision = Decision::new(&self.guard, new_status, actor, rejection_reason)?;
        let current = self.get(application_id).await?;

        let Some(update) = decision.against(current.status)? else {
            debug!(
                application = %application_id,
                status = %current.status,
                "status re-entry ignored"
            );
            return Ok(current);
        };

        let updated_by = update.updated_by.clone();
        let updated = self
            .applications
            .set_status(application_id, update)
            .await
            .map_err(|err| LifecycleError::from_store(ENTITY, application_id, err))?;

        info!(
            application = %application_id,
            from = %current.status,
            to = %updated.status,
            officer = %updated_by,
            "loan application status updated"
        );
        Ok(updated)
    }

    pub async fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<LoanApplication, LifecycleError> {
        self.applications
            .get(application_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(ENTITY, application_id))
    }

    /// An application as seen by its borrower; another borrower's loan reads as missing.
    pub async fn get_for_borrower(
        &self,
        borrower_id: &BorrowerId,
        application_id: &ApplicationId,
    ) -> Result<LoanApplication, LifecycleError> {
        let record = self.get(application_id).await?;
        if record.borrower_id != *borrower_id {
            return Err(LifecycleError::not_found(ENTITY, application_id));
        }
        Ok(record)
    }

    /// Applications newest first, optionally restricted to one status.
    pub async fn list(
        &self,
        filter: Option<LoanStatus>,
    ) -> Result<Vec<LoanApplication>, LifecycleError> {
        let mut records = self.applications.list(filter).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    pub async fn list_for_borrower(
        &self,
        borrower_id: &BorrowerId,
    ) -> Result<Vec<LoanApplication>, LifecycleError> {
        let mut records = self.applications.list_for_borrower(borrower_id).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }
}

fn sort_newest_first(records: &mut [LoanApplication]) {
    records.sort_by(|a, b| {
        b.applied_at
            .cmp(&a.applied_at)
            .then_with(|| sequence_order(&b.id.0, &a.id.0))
    });
}
