//! Shared status vocabulary for loan applications and documents.
//!
//! Both lifecycles run on the same four-phase graph. Each entity keeps its own status enum
//! (a document is `Verified` where a loan is `Approved`) and maps onto [`ReviewPhase`], so the
//! edge table lives in exactly one place.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Entity-independent position in the review graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewPhase {
    Pending,
    UnderReview,
    Accepted,
    Rejected,
}

impl ReviewPhase {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Pending,
            Self::UnderReview,
            Self::Accepted,
            Self::Rejected,
        ]
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Outgoing edges. `UnderReview` lists itself because re-entry is an accepted no-op.
    pub const fn successors(self) -> &'static [ReviewPhase] {
        match self {
            Self::Pending => &[Self::UnderReview, Self::Accepted, Self::Rejected],
            Self::UnderReview => &[Self::UnderReview, Self::Accepted, Self::Rejected],
            Self::Accepted | Self::Rejected => &[],
        }
    }

    pub fn can_reach(self, target: Self) -> bool {
        self.successors().contains(&target)
    }
}

/// A per-entity status enum that projects onto the shared review graph.
pub trait LifecycleStatus:
    Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Entity name used in error messages ("loan application", "document").
    const ENTITY: &'static str;

    fn phase(self) -> ReviewPhase;

    fn from_phase(phase: ReviewPhase) -> Self;

    fn label(self) -> &'static str;

    fn initial() -> Self {
        Self::from_phase(ReviewPhase::Pending)
    }

    fn is_terminal(self) -> bool {
        self.phase().is_terminal()
    }

    fn all() -> [Self; 4] {
        ReviewPhase::ordered().map(Self::from_phase)
    }

    fn from_label(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Self::all()
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(wanted))
    }

    /// Statuses an officer may move to from `self`, excluding the no-op re-entry.
    fn allowed_targets(self) -> Vec<Self> {
        self.phase()
            .successors()
            .iter()
            .copied()
            .filter(|phase| *phase != self.phase())
            .map(Self::from_phase)
            .collect()
    }
}

/// Result of checking a requested transition against the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCheck {
    /// The status changes and must be persisted.
    Apply,
    /// The target equals the current status and re-entry is allowed; nothing is written.
    NoOp,
}

/// Status graph violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} cannot move from {from} to {to}")]
pub struct IllegalTransition {
    pub entity: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

pub fn check_transition<S: LifecycleStatus>(
    current: S,
    target: S,
) -> Result<TransitionCheck, IllegalTransition> {
    if !current.phase().can_reach(target.phase()) {
        return Err(IllegalTransition {
            entity: S::ENTITY,
            from: current.label(),
            to: target.label(),
        });
    }

    if current == target {
        Ok(TransitionCheck::NoOp)
    } else {
        Ok(TransitionCheck::Apply)
    }
}

/// Status of a loan application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl LifecycleStatus for LoanStatus {
    const ENTITY: &'static str = "loan application";

    fn phase(self) -> ReviewPhase {
        match self {
            Self::Pending => ReviewPhase::Pending,
            Self::UnderReview => ReviewPhase::UnderReview,
            Self::Approved => ReviewPhase::Accepted,
            Self::Rejected => ReviewPhase::Rejected,
        }
    }

    fn from_phase(phase: ReviewPhase) -> Self {
        match phase {
            ReviewPhase::Pending => Self::Pending,
            ReviewPhase::UnderReview => Self::UnderReview,
            ReviewPhase::Accepted => Self::Approved,
            ReviewPhase::Rejected => Self::Rejected,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

/// Status of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Pending,
    UnderReview,
    Verified,
    Rejected,
}

impl LifecycleStatus for DocumentStatus {
    const ENTITY: &'static str = "document";

    fn phase(self) -> ReviewPhase {
        match self {
            Self::Pending => ReviewPhase::Pending,
            Self::UnderReview => ReviewPhase::UnderReview,
            Self::Verified => ReviewPhase::Accepted,
            Self::Rejected => ReviewPhase::Rejected,
        }
    }

    fn from_phase(phase: ReviewPhase) -> Self {
        match phase {
            ReviewPhase::Pending => Self::Pending,
            ReviewPhase::UnderReview => Self::UnderReview,
            ReviewPhase::Accepted => Self::Verified,
            ReviewPhase::Rejected => Self::Rejected,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Verified => "VERIFIED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status filter shared by the review views: everything, or one phase across both entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ReviewPhase),
}

impl StatusFilter {
    pub fn matches<S: LifecycleStatus>(self, status: S) -> bool {
        match self {
            Self::All => true,
            Self::Only(phase) => status.phase() == phase,
        }
    }

    /// Parse `ALL` or any loan/document status label.
    pub fn from_label(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("ALL") {
            return Some(Self::All);
        }
        LoanStatus::from_label(raw)
            .map(|status| Self::Only(status.phase()))
            .or_else(|| DocumentStatus::from_label(raw).map(|status| Self::Only(status.phase())))
    }
}
