use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::{
    LoanScore, RiskLevel, ScoreBreakdown, ScoreGrade, ScoreProvider, ScoringError, MAX_SCORE,
};
use crate::origination::domain::{
    ApplicationId, BorrowerProfile, EmploymentStatus, LoanApplication,
};
use crate::origination::repository::{ApplicationStore, BorrowerStore};

const EMPLOYMENT_WEIGHT: u32 = 35;
const INCOME_WEIGHT: u32 = 25;
const LOAN_TO_VALUE_WEIGHT: u32 = 20;
const DEBT_TO_INCOME_WEIGHT: u32 = 15;
const EMPLOYMENT_YEARS_WEIGHT: u32 = 5;

const SHORT_TERM_MONTHS: u16 = 24;
const SHORT_TERM_BONUS: u16 = 20;

/// In-process scorer applying the weighted factor model to stored applications.
pub struct ReferenceScoringModel<A, B> {
    applications: Arc<A>,
    borrowers: Arc<B>,
    online: AtomicBool,
}

impl<A, B> ReferenceScoringModel<A, B>
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
{
    pub fn new(applications: Arc<A>, borrowers: Arc<B>) -> Self {
        Self {
            applications,
            borrowers,
            online: AtomicBool::new(true),
        }
    }

    pub fn with_availability(self, online: bool) -> Self {
        self.set_available(online);
        self
    }

    /// Toggle the simulated outage.
    pub fn set_available(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl<A, B> ScoreProvider for ReferenceScoringModel<A, B>
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
{
    async fn fetch(&self, application_id: &ApplicationId) -> Result<LoanScore, ScoringError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(ScoringError::Unavailable);
        }

        let application = self
            .applications
            .get(application_id)
            .await
            .map_err(|error| ScoringError::Transport(error.to_string()))?
            .ok_or_else(|| ScoringError::UnknownApplication(application_id.clone()))?;
        let borrower = self
            .borrowers
            .get(&application.borrower_id)
            .await
            .map_err(|error| ScoringError::Transport(error.to_string()))?
            .ok_or_else(|| {
                ScoringError::Transport(format!("borrower {} missing", application.borrower_id))
            })?;

        Ok(score_application(&application, &borrower))
    }

    async fn is_available(&self) -> Result<bool, ScoringError> {
        Ok(self.online.load(Ordering::SeqCst))
    }
}

pub(crate) fn score_application(
    application: &LoanApplication,
    borrower: &BorrowerProfile,
) -> LoanScore {
    let mut notes = Vec::new();

    let employment = match borrower.employment_status {
        EmploymentStatus::Employed => 1000,
        EmploymentStatus::SelfEmployed => 800,
        EmploymentStatus::Retired => 600,
        EmploymentStatus::Unemployed => 200,
    };
    notes.push(format!(
        "employment status {:?} scored {employment}",
        borrower.employment_status
    ));

    let income = income_score(borrower.annual_income);
    notes.push(format!(
        "annual income {:.2} scored {income}",
        borrower.annual_income
    ));

    let loan_to_value = if borrower.annual_income > 0.0 {
        let ratio = application.loan_amount / borrower.annual_income;
        let score = ratio_score(ratio, [0.2, 0.5, 1.0, 2.0]);
        notes.push(format!("loan-to-income ratio {ratio:.2} scored {score}"));
        score
    } else {
        notes.push("no declared income to cover the loan".to_string());
        100
    };

    let monthly_income = borrower.monthly_income();
    let debt_to_income = if monthly_income > 0.0 {
        let ratio = application.monthly_payment() / monthly_income;
        let score = ratio_score(ratio, [0.10, 0.20, 0.30, 0.40]);
        notes.push(format!("payment-to-income ratio {ratio:.2} scored {score}"));
        score
    } else {
        200
    };

    let employment_years = u16::from(borrower.employment_years.min(10)) * 100;

    let loan_term_bonus = (application.loan_term_months <= SHORT_TERM_MONTHS).then(|| {
        notes.push(format!(
            "{}-month term earns a {SHORT_TERM_BONUS} point bonus",
            application.loan_term_months
        ));
        SHORT_TERM_BONUS
    });

    let weighted = (u32::from(employment) * EMPLOYMENT_WEIGHT
        + u32::from(income) * INCOME_WEIGHT
        + u32::from(loan_to_value) * LOAN_TO_VALUE_WEIGHT
        + u32::from(debt_to_income) * DEBT_TO_INCOME_WEIGHT
        + u32::from(employment_years) * EMPLOYMENT_YEARS_WEIGHT)
        / 100;
    let bonus = u32::from(loan_term_bonus.unwrap_or(0));
    let total_score = (weighted + bonus).min(u32::from(MAX_SCORE)) as u16;

    LoanScore {
        application_id: application.id.clone(),
        borrower_id: application.borrower_id.clone(),
        total_score,
        score_grade: ScoreGrade::from_total(total_score),
        risk_assessment: RiskLevel::from_total(total_score),
        score_breakdown: ScoreBreakdown {
            employment,
            income,
            loan_to_value,
            debt_to_income,
            employment_years,
            loan_term_bonus,
        },
        calculated_at: Utc::now(),
        service_available: true,
        notes,
    }
}

fn income_score(annual_income: f64) -> u16 {
    match annual_income {
        income if income >= 150_000.0 => 1000,
        income if income >= 100_000.0 => 850,
        income if income >= 75_000.0 => 700,
        income if income >= 50_000.0 => 550,
        income if income >= 30_000.0 => 400,
        _ => 200,
    }
}

/// Lower ratios score higher; `bounds` are the inclusive upper edges of the 1000/800/600/400
/// bands.
fn ratio_score(ratio: f64, bounds: [f64; 4]) -> u16 {
    const BANDS: [u16; 4] = [1000, 800, 600, 400];
    bounds
        .iter()
        .zip(BANDS)
        .find(|(bound, _)| ratio <= **bound)
        .map(|(_, score)| score)
        .unwrap_or(200)
}
