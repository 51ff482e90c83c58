use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    ApplicationId, BorrowerDraft, BorrowerId, DocumentId, DocumentUpload, LoanApplicationView,
    LoanRequest,
};
use super::payment::PaymentQuoteRequest;
use super::repository::{ApplicationStore, BorrowerStore, DocumentStore, RepositoryError};
use super::scoring::{
    filter_by_grade, filter_by_risk, RiskLevel, ScoreGrade, ScoreMap, ScoreResult,
};
use super::service::{LifecycleError, LoanOrigination};
use super::status::{DocumentStatus, LifecycleStatus, LoanStatus};

type Shared<A, B, D> = State<Arc<LoanOrigination<A, B, D>>>;

/// Router exposing borrower intake and officer review endpoints.
pub fn origination_router<A, B, D>(origination: Arc<LoanOrigination<A, B, D>>) -> Router
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    Router::new()
        .route("/api/borrowers", post(create_borrower::<A, B, D>))
        .route(
            "/api/borrowers/calculate-loan",
            post(calculate_loan::<A, B, D>),
        )
        .route("/api/borrowers/:borrower_id", get(get_borrower::<A, B, D>))
        .route(
            "/api/borrowers/user/:user_id",
            get(borrower_by_user::<A, B, D>),
        )
        .route(
            "/api/borrowers/email/:email",
            get(borrower_by_email::<A, B, D>),
        )
        .route(
            "/api/borrowers/:borrower_id/loans",
            post(submit_loan::<A, B, D>).get(borrower_loans::<A, B, D>),
        )
        .route(
            "/api/borrowers/:borrower_id/loans/:application_id",
            get(borrower_loan::<A, B, D>),
        )
        .route(
            "/api/borrowers/:borrower_id/documents",
            post(upload_document::<A, B, D>).get(borrower_documents::<A, B, D>),
        )
        .route("/admin/loans", get(list_loans::<A, B, D>))
        .route("/admin/loans/:application_id", get(get_loan::<A, B, D>))
        .route(
            "/admin/loans/:application_id/status",
            put(update_loan_status::<A, B, D>),
        )
        .route(
            "/admin/loans/:application_id/documents",
            get(loan_documents::<A, B, D>),
        )
        .route(
            "/admin/loans/:application_id/score",
            get(loan_score::<A, B, D>),
        )
        .route("/admin/documents", get(list_documents::<A, B, D>))
        .route(
            "/admin/documents/:document_id",
            get(get_document::<A, B, D>),
        )
        .route(
            "/admin/documents/:document_id/status",
            put(update_document_status::<A, B, D>),
        )
        .route(
            "/admin/status/loan-statuses",
            get(status_catalog::<LoanStatus>),
        )
        .route(
            "/admin/status/document-statuses",
            get(status_catalog::<DocumentStatus>),
        )
        .route(
            "/admin/borrowers/:borrower_id/scores",
            get(borrower_scores::<A, B, D>),
        )
        .route(
            "/admin/scores/grade/:grade",
            get(scores_by_grade::<A, B, D>),
        )
        .route("/admin/scores/risk/:risk", get(scores_by_risk::<A, B, D>))
        .route(
            "/admin/scores/service-status",
            get(scoring_status::<A, B, D>),
        )
        .with_state(origination)
}

/// Officer decision body for the status endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: String,
    pub updated_by: String,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusEntry {
    status: &'static str,
    terminal: bool,
    allowed_targets: Vec<&'static str>,
}

/// Map a lifecycle error onto its HTTP status and JSON body.
pub fn error_response(error: LifecycleError) -> Response {
    let status = match &error {
        LifecycleError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LifecycleError::IllegalTransition(_) | LifecycleError::StaleStatus { .. } => {
            StatusCode::CONFLICT
        }
        LifecycleError::NotFound { .. } => StatusCode::NOT_FOUND,
        LifecycleError::Store(RepositoryError::Conflict) => StatusCode::CONFLICT,
        LifecycleError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn unknown_label(kind: &str, raw: &str) -> Response {
    let payload = json!({ "error": format!("unknown {kind} '{raw}'") });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}

fn unknown_status(raw: &str) -> Response {
    let payload = json!({ "error": format!("unknown status '{raw}'") });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}

/// `None` or `ALL` means no filter.
fn parse_filter<S: LifecycleStatus>(raw: Option<&str>) -> Result<Option<S>, Response> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) if label.eq_ignore_ascii_case("ALL") => Ok(None),
        Some(label) => S::from_label(label)
            .map(Some)
            .ok_or_else(|| unknown_status(label)),
    }
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, LifecycleError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_borrower<A, B, D>(
    State(origination): Shared<A, B, D>,
    Json(draft): Json<BorrowerDraft>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    match origination.borrowers().resolve_profile(draft).await {
        Ok(ensured) if ensured.created => respond(StatusCode::CREATED, Ok(ensured.profile)),
        Ok(ensured) => respond(StatusCode::OK, Ok(ensured.profile)),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_borrower<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(borrower_id): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let result = origination.borrowers().get(&BorrowerId(borrower_id)).await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn borrower_by_user<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(user_id): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let result = origination.borrowers().find_by_user(&user_id).await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn borrower_by_email<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(email): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let result = origination.borrowers().find_by_email(&email).await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn submit_loan<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(borrower_id): Path<String>,
    Json(request): Json<LoanRequest>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let result = origination
        .loans()
        .submit(&BorrowerId(borrower_id), request)
        .await
        .map(|record| record.view());
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn borrower_loans<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(borrower_id): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let result = origination
        .loans()
        .list_for_borrower(&BorrowerId(borrower_id))
        .await
        .map(|records| records.iter().map(|record| record.view()).collect::<Vec<_>>());
    respond(StatusCode::OK, result)
}

pub(crate) async fn borrower_loan<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path((borrower_id, application_id)): Path<(String, String)>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let result = origination
        .loans()
        .get_for_borrower(&BorrowerId(borrower_id), &ApplicationId(application_id))
        .await
        .map(|record| record.view());
    respond(StatusCode::OK, result)
}

pub(crate) async fn upload_document<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(borrower_id): Path<String>,
    Json(upload): Json<DocumentUpload>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let result = origination
        .documents()
        .upload(&BorrowerId(borrower_id), upload)
        .await;
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn borrower_documents<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(borrower_id): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let result = origination
        .documents()
        .list_for_borrower(&BorrowerId(borrower_id))
        .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn calculate_loan<A, B, D>(
    State(origination): Shared<A, B, D>,
    Json(request): Json<PaymentQuoteRequest>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    respond(StatusCode::OK, origination.quote(&request))
}

pub(crate) async fn list_loans<A, B, D>(
    State(origination): Shared<A, B, D>,
    Query(query): Query<StatusQuery>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let filter = match parse_filter::<LoanStatus>(query.status.as_deref()) {
        Ok(filter) => filter,
        Err(response) => return response,
    };
    let result = origination
        .loans()
        .list(filter)
        .await
        .map(|records| records.iter().map(|record| record.view()).collect::<Vec<_>>());
    respond(StatusCode::OK, result)
}

pub(crate) async fn get_loan<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let result = origination
        .loans()
        .get(&ApplicationId(application_id))
        .await
        .map(|record| record.view());
    respond(StatusCode::OK, result)
}

pub(crate) async fn update_loan_status<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(application_id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let Some(status) = LoanStatus::from_label(&change.status) else {
        return unknown_status(&change.status);
    };
    let result: Result<LoanApplicationView, _> = origination
        .loans()
        .transition(
            &ApplicationId(application_id),
            status,
            &change.updated_by,
            change.rejection_reason.as_deref(),
        )
        .await
        .map(|record| record.view());
    respond(StatusCode::OK, result)
}

pub(crate) async fn loan_documents<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let id = ApplicationId(application_id);
    if let Err(error) = origination.loans().get(&id).await {
        return error_response(error);
    }

    let documents = origination.documents();
    let result = match documents.list_for_application(&id).await {
        Ok(records) => documents
            .summary_for_application(&id)
            .await
            .map(|summary| json!({ "documents": records, "summary": summary })),
        Err(error) => Err(error),
    };
    respond(StatusCode::OK, result)
}

pub(crate) async fn loan_score<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let id = ApplicationId(application_id);
    if let Err(error) = origination.loans().get(&id).await {
        return error_response(error);
    }

    let result = match origination.scoring() {
        Some(client) => client.get_score(&id).await,
        None => ScoreResult::disabled(&id),
    };
    (StatusCode::OK, Json(result)).into_response()
}

pub(crate) async fn borrower_scores<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(borrower_id): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let borrower_id = BorrowerId(borrower_id);
    if let Err(error) = origination.borrowers().get(&borrower_id).await {
        return error_response(error);
    }
    let records = match origination.loans().list_for_borrower(&borrower_id).await {
        Ok(records) => records,
        Err(error) => return error_response(error),
    };

    let ids: Vec<ApplicationId> = records.into_iter().map(|record| record.id).collect();
    let mut scores = match origination.scoring() {
        Some(client) => client.list_scores(&ids).await,
        None => ScoreMap::new(),
    };
    // Newest application first, matching the loan listing.
    let results: Vec<ScoreResult> = ids
        .iter()
        .map(|id| scores.remove(id).unwrap_or_else(|| ScoreResult::disabled(id)))
        .collect();
    (StatusCode::OK, Json(results)).into_response()
}

/// Scores for every application; empty when no scoring client is attached.
async fn all_scores<A, B, D>(
    origination: &LoanOrigination<A, B, D>,
) -> Result<ScoreMap, LifecycleError>
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let Some(client) = origination.scoring() else {
        return Ok(ScoreMap::new());
    };
    let records = origination.loans().list(None).await?;
    Ok(client.list_scores(records.iter().map(|record| &record.id)).await)
}

pub(crate) async fn scores_by_grade<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(raw): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let Some(grade) = ScoreGrade::from_label(&raw) else {
        return unknown_label("score grade", &raw);
    };
    match all_scores(&origination).await {
        Ok(scores) => (StatusCode::OK, Json(filter_by_grade(&scores, grade))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn scores_by_risk<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(raw): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let Some(risk) = RiskLevel::from_label(&raw) else {
        return unknown_label("risk level", &raw);
    };
    match all_scores(&origination).await {
        Ok(scores) => (StatusCode::OK, Json(filter_by_risk(&scores, risk))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_documents<A, B, D>(
    State(origination): Shared<A, B, D>,
    Query(query): Query<StatusQuery>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let filter = match parse_filter::<DocumentStatus>(query.status.as_deref()) {
        Ok(filter) => filter,
        Err(response) => return response,
    };
    let result = origination.documents().list_all(filter).await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn get_document<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(document_id): Path<String>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let result = origination.documents().get(&DocumentId(document_id)).await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn update_document_status<A, B, D>(
    State(origination): Shared<A, B, D>,
    Path(document_id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    let Some(status) = DocumentStatus::from_label(&change.status) else {
        return unknown_status(&change.status);
    };
    let result = origination
        .documents()
        .transition(
            &DocumentId(document_id),
            status,
            &change.updated_by,
            change.rejection_reason.as_deref(),
        )
        .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn status_catalog<S: LifecycleStatus>() -> Response {
    let entries: Vec<StatusEntry> = S::all()
        .into_iter()
        .map(|status| StatusEntry {
            status: status.label(),
            terminal: status.is_terminal(),
            allowed_targets: status
                .allowed_targets()
                .into_iter()
                .map(|target| target.label())
                .collect(),
        })
        .collect();
    (StatusCode::OK, Json(entries)).into_response()
}

pub(crate) async fn scoring_status<A, B, D>(State(origination): Shared<A, B, D>) -> Response
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    match origination.scoring() {
        Some(client) => (StatusCode::OK, Json(client.service_status().await)).into_response(),
        None => {
            let payload = json!({
                "available": false,
                "detail": "scoring service is disabled",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
    }
}
