use serde::{Deserialize, Serialize};

/// Amortized monthly installment for an annual percentage `rate` over `term_months`.
///
/// `term_months` must be one of the offered terms; intake rejects anything else before a
/// payment is derived. A zero rate degenerates to straight division.
pub fn monthly_payment(amount: f64, rate: f64, term_months: u16) -> f64 {
    let periods = f64::from(term_months);
    let monthly_rate = rate / 100.0 / 12.0;
    if monthly_rate == 0.0 {
        return amount / periods;
    }

    amount * monthly_rate / (1.0 - (1.0 + monthly_rate).powf(-periods))
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuoteRequest {
    pub loan_amount: f64,
    pub loan_term_months: u16,
    pub interest_rate: f64,
}

/// Repayment projection for the calculator endpoint. Build it from a request that passed
/// [`IntakeGuard::check_quote`](super::intake::IntakeGuard::check_quote).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuote {
    pub loan_amount: f64,
    pub loan_term_months: u16,
    pub interest_rate: f64,
    pub monthly_payment: f64,
    pub total_repayment: f64,
    pub total_interest: f64,
}

impl PaymentQuote {
    pub fn calculate(request: &PaymentQuoteRequest) -> Self {
        let payment = monthly_payment(
            request.loan_amount,
            request.interest_rate,
            request.loan_term_months,
        );
        let total = payment * f64::from(request.loan_term_months);

        Self {
            loan_amount: request.loan_amount,
            loan_term_months: request.loan_term_months,
            interest_rate: request.interest_rate,
            monthly_payment: round_cents(payment),
            total_repayment: round_cents(total),
            total_interest: round_cents(total - request.loan_amount),
        }
    }
}
