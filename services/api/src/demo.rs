use chrono::Utc;
use clap::Args;
use loan_review::config::ReviewConfig;
use loan_review::error::AppError;
use loan_review::origination::{
    BorrowerDraft, DocumentStatus, DocumentType, DocumentUpload, EmploymentStatus, FileMeta,
    IntakeGuard, IntakePolicy, LifecycleError, LoanOrigination, LoanRequest, LoanStatus,
    LoanType, MemoryApplicationStore, MemoryBorrowerStore, MemoryDocumentStore, PaymentQuote,
    PaymentQuoteRequest, ReferenceScoringModel, ReviewSession, ScoreResult, ScoringClient,
    TransitionOutcome, TransitionTarget,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Officer recorded as the reviewer of every decision
    #[arg(long, default_value = "officer.demo")]
    pub(crate) officer: String,
    /// Amount requested by the demo borrower
    #[arg(long, default_value_t = 25_000.0)]
    pub(crate) loan_amount: f64,
    /// Start with the scoring service offline and bring it back mid-review
    #[arg(long)]
    pub(crate) simulate_outage: bool,
    /// Reject the application instead of approving it
    #[arg(long)]
    pub(crate) reject_with: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Principal to borrow
    #[arg(long)]
    pub(crate) amount: f64,
    /// Repayment term in months
    #[arg(long, default_value_t = 36)]
    pub(crate) term_months: u16,
    /// Annual interest rate as a percentage
    #[arg(long, default_value_t = 6.5)]
    pub(crate) rate: f64,
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let request = PaymentQuoteRequest {
        loan_amount: args.amount,
        loan_term_months: args.term_months,
        interest_rate: args.rate,
    };
    IntakeGuard::with_policy(IntakePolicy::from(&ReviewConfig::default()))
        .check_quote(&request)
        .map_err(LifecycleError::from)?;
    let quote = PaymentQuote::calculate(&request);

    println!(
        "Loan quote: {:.2} over {} months at {:.2}%",
        quote.loan_amount, quote.loan_term_months, quote.interest_rate
    );
    println!("- Monthly payment: {:.2}", quote.monthly_payment);
    println!("- Total repayment: {:.2}", quote.total_repayment);
    println!("- Total interest:  {:.2}", quote.total_interest);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        officer,
        loan_amount,
        simulate_outage,
        reject_with,
    } = args;

    let config = ReviewConfig::default();
    let applications = Arc::new(MemoryApplicationStore::default());
    let borrowers = Arc::new(MemoryBorrowerStore::default());
    let model = Arc::new(
        ReferenceScoringModel::new(applications.clone(), borrowers.clone())
            .with_availability(!simulate_outage),
    );
    let origination = Arc::new(
        LoanOrigination::new(
            applications,
            borrowers,
            Arc::new(MemoryDocumentStore::default()),
            IntakePolicy::from(&config),
        )
        .with_scoring(ScoringClient::new(model.clone())),
    );

    println!("Borrower intake");
    let borrower = origination
        .borrowers()
        .ensure_profile(demo_borrower())
        .await?;
    println!(
        "- Profile {} for {} ({:.0} annual income)",
        borrower.id,
        borrower.full_name(),
        borrower.annual_income
    );

    let application = match origination
        .loans()
        .submit(&borrower.id, demo_request(loan_amount))
        .await
    {
        Ok(application) => application,
        Err(err) => {
            println!("  Submission rejected: {}", err);
            return Ok(());
        }
    };
    println!(
        "- Application {} -> status {} (monthly payment {:.2})",
        application.id,
        application.status,
        application.monthly_payment()
    );

    for (kind, file_name) in [
        (DocumentType::IdProof, "passport.pdf"),
        (DocumentType::IncomeProof, "paystub-june.pdf"),
    ] {
        let document = origination
            .documents()
            .upload(
                &borrower.id,
                DocumentUpload {
                    loan_application_id: Some(application.id.clone()),
                    document_type: kind,
                    document_name: None,
                    description: None,
                    file: FileMeta {
                        file_name: file_name.to_string(),
                        file_size: 240_000,
                    },
                },
            )
            .await?;
        println!(
            "- Uploaded {} {} ({})",
            kind.label(),
            document.id,
            document.content_type
        );
    }

    println!("\nOfficer review as {}", officer);
    let mut session = ReviewSession::new(origination.clone(), officer);
    session.refresh().await?;
    print_score(session.score_for(&application.id));
    if let Some(status) = session.service_status().await {
        println!(
            "  Scoring service: {} ({})",
            if status.available { "up" } else { "down" },
            status.detail
        );
    }

    let document_ids: Vec<_> = session
        .visible_documents()
        .into_iter()
        .map(|document| document.id.clone())
        .collect();
    for id in document_ids {
        session.request_transition(TransitionTarget::Document {
            id,
            status: DocumentStatus::Verified,
        });
        if let TransitionOutcome::Document(document) = session.commit_transition().await? {
            println!("- Document {} -> {}", document.id, document.status);
        }
    }
    let summary = session.document_summary(&application.id);
    println!(
        "  Documents: {} total, {} verified, complete = {}",
        summary.total,
        summary.verified,
        summary.is_complete()
    );

    if simulate_outage {
        model.set_available(true);
        session.refresh().await?;
        println!("  Scoring service restored");
        print_score(session.score_for(&application.id));
    }

    let target = if reject_with.is_some() {
        LoanStatus::Rejected
    } else {
        LoanStatus::Approved
    };
    session.request_transition(TransitionTarget::Loan {
        id: application.id.clone(),
        status: target,
    });
    if let Some(reason) = reject_with {
        session.set_rejection_reason(reason)?;
    }
    if let TransitionOutcome::Loan(decided) = session.commit_transition().await? {
        println!(
            "- Application {} -> {} by {}",
            decided.id,
            decided.status,
            decided.status_updated_by.as_deref().unwrap_or("unknown")
        );
        if let Some(reason) = decided.rejection_reason.as_deref() {
            println!("  Rejection reason: {}", reason);
        }
    }

    let counts = session.status_counts();
    println!(
        "\nQueue at {}: {} total / {} pending / {} under review / {} approved / {} rejected",
        Utc::now().format("%Y-%m-%d %H:%M"),
        counts.total,
        counts.pending,
        counts.under_review,
        counts.approved,
        counts.rejected
    );

    Ok(())
}

fn print_score(score: Option<&ScoreResult>) {
    match score {
        Some(ScoreResult::Available(score)) => {
            println!(
                "  Score {} ({} / {} risk)",
                score.total_score, score.score_grade, score.risk_assessment
            );
            for note in &score.notes {
                println!("    - {}", note);
            }
        }
        Some(ScoreResult::Unavailable { reason, .. }) => {
            println!("  Score unavailable: {}", reason);
        }
        None => println!("  Scoring not attached"),
    }
}

fn demo_borrower() -> BorrowerDraft {
    BorrowerDraft {
        user_id: "demo-borrower".to_string(),
        first_name: "Avery".to_string(),
        last_name: "Quinn".to_string(),
        email: "avery.quinn@example.com".to_string(),
        phone_number: None,
        date_of_birth: None,
        address: None,
        annual_income: 92_000.0,
        employment_status: EmploymentStatus::Employed,
        employer_name: Some("Northwind Logistics".to_string()),
        employment_years: 6,
    }
}

fn demo_request(loan_amount: f64) -> LoanRequest {
    LoanRequest {
        loan_type: LoanType::Personal,
        loan_amount,
        loan_term_months: 36,
        interest_rate: 6.5,
        purpose: "home renovation".to_string(),
    }
}
