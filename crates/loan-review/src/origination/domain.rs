use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::payment::{monthly_payment, round_cents};
use super::status::{DocumentStatus, LoanStatus};

/// Identifier wrapper for borrower profiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BorrowerId(pub String);

/// Identifier wrapper for submitted loan applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for uploaded documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl fmt::Display for BorrowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentStatus {
    Employed,
    SelfEmployed,
    Unemployed,
    Retired,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

/// Profile fields supplied by a borrower before their first application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerDraft {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<PostalAddress>,
    pub annual_income: f64,
    pub employment_status: EmploymentStatus,
    #[serde(default)]
    pub employer_name: Option<String>,
    #[serde(default)]
    pub employment_years: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerProfile {
    pub id: BorrowerId,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<PostalAddress>,
    pub annual_income: f64,
    pub employment_status: EmploymentStatus,
    pub employer_name: Option<String>,
    pub employment_years: u8,
    pub created_at: DateTime<Utc>,
}

impl BorrowerProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn monthly_income(&self) -> f64 {
        self.annual_income / 12.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanType {
    #[default]
    Personal,
    Auto,
    Mortgage,
    Business,
}

/// Borrower supplied loan request prior to intake validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    #[serde(default)]
    pub loan_type: LoanType,
    pub loan_amount: f64,
    pub loan_term_months: u16,
    pub interest_rate: f64,
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplication {
    pub id: ApplicationId,
    pub borrower_id: BorrowerId,
    pub loan_type: LoanType,
    pub loan_amount: f64,
    pub loan_term_months: u16,
    pub interest_rate: f64,
    pub purpose: String,
    pub status: LoanStatus,
    pub status_updated_by: Option<String>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub applied_at: DateTime<Utc>,
}

impl LoanApplication {
    /// Installment derived from amount, rate, and term; never persisted.
    pub fn monthly_payment(&self) -> f64 {
        round_cents(monthly_payment(
            self.loan_amount,
            self.interest_rate,
            self.loan_term_months,
        ))
    }

    pub fn view(&self) -> LoanApplicationView {
        LoanApplicationView {
            application: self.clone(),
            monthly_payment: self.monthly_payment(),
        }
    }
}

/// Read projection handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplicationView {
    #[serde(flatten)]
    pub application: LoanApplication,
    pub monthly_payment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    IdProof,
    IncomeProof,
    AddressProof,
    BankStatement,
    Other,
}

impl DocumentType {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::IdProof,
            Self::IncomeProof,
            Self::AddressProof,
            Self::BankStatement,
            Self::Other,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::IdProof => "ID_PROOF",
            Self::IncomeProof => "INCOME_PROOF",
            Self::AddressProof => "ADDRESS_PROOF",
            Self::BankStatement => "BANK_STATEMENT",
            Self::Other => "OTHER",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(wanted))
    }
}

/// Metadata for an uploaded file; the bytes themselves live in external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub file_name: String,
    pub file_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpload {
    #[serde(default)]
    pub loan_application_id: Option<ApplicationId>,
    pub document_type: DocumentType,
    #[serde(default)]
    pub document_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub file: FileMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub borrower_id: BorrowerId,
    pub loan_application_id: Option<ApplicationId>,
    pub document_type: DocumentType,
    pub document_name: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_size: u64,
    pub content_type: String,
    pub status: DocumentStatus,
    pub status_updated_by: Option<String>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}
