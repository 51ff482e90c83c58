use std::path::Path;

use crate::config::ReviewConfig;

use super::domain::{BorrowerDraft, DocumentType, DocumentUpload, LoanRequest};
use super::payment::PaymentQuoteRequest;

/// Loan terms offered to borrowers, in months.
pub const PERMITTED_TERMS: [u16; 5] = [12, 24, 36, 48, 60];

pub const MAX_INTEREST_RATE: f64 = 30.0;

/// Malformed input, reported before any store call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("loan amount {found} is outside the permitted range {min}..={max}")]
    LoanAmountOutOfRange { min: f64, max: f64, found: f64 },
    #[error("loan term of {0} months is not offered")]
    UnsupportedTerm(u16),
    #[error("interest rate {0}% must be between 0 and 30")]
    InterestRateOutOfRange(f64),
    #[error("loan purpose is required")]
    MissingPurpose,
    #[error("a rejection reason is required")]
    MissingRejectionReason,
    #[error("the officer recording the decision must be named")]
    MissingActor,
    #[error("file name is required")]
    MissingFileName,
    #[error("file is empty")]
    EmptyFile,
    #[error("file of {found} bytes exceeds the {max} byte limit")]
    FileTooLarge { max: u64, found: u64 },
    #[error("file format of '{0}' is not accepted (PDF, JPG, PNG, DOC, DOCX)")]
    UnsupportedFileFormat(String),
    #[error("document type {0:?} is not accepted")]
    DocumentTypeNotAllowed(DocumentType),
    #[error("loan application {application} belongs to a different borrower")]
    ApplicationBorrowerMismatch { application: String },
    #[error("borrower profile field '{0}' is required")]
    MissingProfileField(&'static str),
    #[error("email address '{0}' is malformed")]
    InvalidEmail(String),
    #[error("annual income must be a non-negative amount")]
    InvalidIncome,
}

/// Numeric limits backing intake validation.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakePolicy {
    min_loan_amount: f64,
    max_loan_amount: f64,
    max_document_bytes: u64,
    allowed_document_types: Vec<DocumentType>,
    required_document_types: Vec<DocumentType>,
}

impl IntakePolicy {
    pub fn new(min_loan_amount: f64, max_loan_amount: f64, max_document_bytes: u64) -> Self {
        Self {
            min_loan_amount,
            max_loan_amount,
            max_document_bytes,
            allowed_document_types: DocumentType::ordered().to_vec(),
            required_document_types: vec![DocumentType::IdProof, DocumentType::IncomeProof],
        }
    }

    pub fn with_allowed_document_types(mut self, types: Vec<DocumentType>) -> Self {
        self.allowed_document_types = types;
        self
    }

    pub fn with_required_document_types(mut self, types: Vec<DocumentType>) -> Self {
        self.required_document_types = types;
        self
    }

    pub fn max_document_bytes(&self) -> u64 {
        self.max_document_bytes
    }

    pub fn required_document_types(&self) -> &[DocumentType] {
        &self.required_document_types
    }
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self::from(&ReviewConfig::default())
    }
}

impl From<&ReviewConfig> for IntakePolicy {
    fn from(config: &ReviewConfig) -> Self {
        Self::new(
            config.min_loan_amount,
            config.max_loan_amount,
            config.max_document_bytes,
        )
        .with_required_document_types(config.required_document_types.clone())
    }
}

const ACCEPTED_EXTENSIONS: [&str; 6] = ["pdf", "jpg", "jpeg", "png", "doc", "docx"];

/// Guard that turns raw borrower/officer input into validated values.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    policy: IntakePolicy,
}

impl IntakeGuard {
    pub fn with_policy(policy: IntakePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    pub fn check_loan_request(&self, request: &LoanRequest) -> Result<(), ValidationError> {
        self.check_terms(
            request.loan_amount,
            request.loan_term_months,
            request.interest_rate,
        )?;

        if request.purpose.trim().is_empty() {
            return Err(ValidationError::MissingPurpose);
        }

        Ok(())
    }

    /// Calculator input follows the same amount, term and rate rules as a submission.
    pub fn check_quote(&self, request: &PaymentQuoteRequest) -> Result<(), ValidationError> {
        self.check_terms(
            request.loan_amount,
            request.loan_term_months,
            request.interest_rate,
        )
    }

    fn check_terms(
        &self,
        amount: f64,
        term_months: u16,
        rate: f64,
    ) -> Result<(), ValidationError> {
        if !amount.is_finite()
            || amount < self.policy.min_loan_amount
            || amount > self.policy.max_loan_amount
        {
            return Err(ValidationError::LoanAmountOutOfRange {
                min: self.policy.min_loan_amount,
                max: self.policy.max_loan_amount,
                found: amount,
            });
        }

        if !PERMITTED_TERMS.contains(&term_months) {
            return Err(ValidationError::UnsupportedTerm(term_months));
        }

        if !rate.is_finite() || !(0.0..=MAX_INTEREST_RATE).contains(&rate) {
            return Err(ValidationError::InterestRateOutOfRange(rate));
        }

        Ok(())
    }

    pub fn check_borrower(&self, draft: &BorrowerDraft) -> Result<(), ValidationError> {
        let required = [
            ("userId", &draft.user_id),
            ("firstName", &draft.first_name),
            ("lastName", &draft.last_name),
            ("email", &draft.email),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ValidationError::MissingProfileField(*field));
        }

        let email = draft.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Err(ValidationError::InvalidEmail(email.to_string())),
        }

        if !draft.annual_income.is_finite() || draft.annual_income < 0.0 {
            return Err(ValidationError::InvalidIncome);
        }

        Ok(())
    }

    /// Validate upload metadata, returning the content type derived from the file name.
    pub fn check_upload(&self, upload: &DocumentUpload) -> Result<String, ValidationError> {
        if !self
            .policy
            .allowed_document_types
            .contains(&upload.document_type)
        {
            return Err(ValidationError::DocumentTypeNotAllowed(
                upload.document_type,
            ));
        }

        let file_name = upload.file.file_name.trim();
        if file_name.is_empty() {
            return Err(ValidationError::MissingFileName);
        }

        if upload.file.file_size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if upload.file.file_size > self.policy.max_document_bytes {
            return Err(ValidationError::FileTooLarge {
                max: self.policy.max_document_bytes,
                found: upload.file.file_size,
            });
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|found| found.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ValidationError::UnsupportedFileFormat(file_name.to_string()));
        }

        let content_type =
            mime_guess::from_path(file_name).first_or(mime::APPLICATION_OCTET_STREAM);
        Ok(content_type.essence_str().to_string())
    }

    /// Normalise a decision reason: required (non-blank) for rejections, dropped otherwise.
    pub fn rejection_reason(
        &self,
        rejecting: bool,
        reason: Option<&str>,
    ) -> Result<Option<String>, ValidationError> {
        let trimmed = reason.map(str::trim).filter(|value| !value.is_empty());
        match (rejecting, trimmed) {
            (true, Some(reason)) => Ok(Some(reason.to_string())),
            (true, None) => Err(ValidationError::MissingRejectionReason),
            (false, _) => Ok(None),
        }
    }

    pub fn actor(&self, actor: &str) -> Result<String, ValidationError> {
        let actor = actor.trim();
        if actor.is_empty() {
            Err(ValidationError::MissingActor)
        } else {
            Ok(actor.to_string())
        }
    }
}
