use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{next_borrower_id, LifecycleError};
use crate::origination::domain::{BorrowerDraft, BorrowerId, BorrowerProfile};
use crate::origination::intake::IntakeGuard;
use crate::origination::repository::{BorrowerStore, RepositoryError};

const ENTITY: &str = "borrower";

/// Profile returned by [`BorrowerService::resolve_profile`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnsuredProfile {
    pub profile: BorrowerProfile,
    pub created: bool,
}

impl EnsuredProfile {
    fn existing(profile: BorrowerProfile) -> Self {
        Self {
            profile,
            created: false,
        }
    }
}

/// Borrower profiles, created lazily before a first application or upload.
pub struct BorrowerService<B> {
    guard: Arc<IntakeGuard>,
    borrowers: Arc<B>,
}

impl<B> BorrowerService<B>
where
    B: BorrowerStore + 'static,
{
    pub fn new(borrowers: Arc<B>, guard: Arc<IntakeGuard>) -> Self {
        Self { guard, borrowers }
    }

    /// Return the existing profile for the draft's user or email, creating one otherwise.
    pub async fn ensure_profile(
        &self,
        draft: BorrowerDraft,
    ) -> Result<BorrowerProfile, LifecycleError> {
        self.resolve_profile(draft).await.map(|ensured| ensured.profile)
    }

    /// [`ensure_profile`](Self::ensure_profile), reporting whether the profile is new.
    pub async fn resolve_profile(
        &self,
        draft: BorrowerDraft,
    ) -> Result<EnsuredProfile, LifecycleError> {
        self.guard.check_borrower(&draft)?;

        let user_id = draft.user_id.trim().to_string();
        let email = draft.email.trim().to_ascii_lowercase();
        if let Some(existing) = self.lookup(&user_id, &email).await? {
            return Ok(EnsuredProfile::existing(existing));
        }

        let profile = BorrowerProfile {
            id: BorrowerId(next_borrower_id()),
            user_id: user_id.clone(),
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            email: email.clone(),
            phone_number: draft.phone_number,
            date_of_birth: draft.date_of_birth,
            address: draft.address,
            annual_income: draft.annual_income,
            employment_status: draft.employment_status,
            employer_name: draft.employer_name,
            employment_years: draft.employment_years,
            created_at: Utc::now(),
        };

        match self.borrowers.insert(profile).await {
            Ok(stored) => {
                info!(borrower = %stored.id, user = %stored.user_id, "borrower profile created");
                Ok(EnsuredProfile {
                    profile: stored,
                    created: true,
                })
            }
            // Another request created the same profile first.
            Err(RepositoryError::Conflict) => self
                .lookup(&user_id, &email)
                .await?
                .map(EnsuredProfile::existing)
                .ok_or_else(|| LifecycleError::not_found(ENTITY, &user_id)),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn get(&self, borrower_id: &BorrowerId) -> Result<BorrowerProfile, LifecycleError> {
        self.borrowers
            .get(borrower_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(ENTITY, borrower_id))
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<BorrowerProfile, LifecycleError> {
        self.borrowers
            .find_by_user(user_id.trim())
            .await?
            .ok_or_else(|| LifecycleError::not_found(ENTITY, user_id))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<BorrowerProfile, LifecycleError> {
        let email = email.trim().to_ascii_lowercase();
        self.borrowers
            .find_by_email(&email)
            .await?
            .ok_or_else(|| LifecycleError::not_found(ENTITY, &email))
    }

    async fn lookup(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<Option<BorrowerProfile>, RepositoryError> {
        if let Some(found) = self.borrowers.find_by_user(user_id).await? {
            return Ok(Some(found));
        }
        self.borrowers.find_by_email(email).await
    }
}
