use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::origination::domain::DocumentType;
use crate::origination::intake::ValidationError;
use crate::origination::repository::RepositoryError;
use crate::origination::router::{error_response, origination_router};
use crate::origination::scoring::ScoringClient;
use crate::origination::service::LifecycleError;
use crate::origination::status::{IllegalTransition, LoanStatus};
use crate::origination::MemoryOrigination;

fn router_for(origination: MemoryOrigination) -> Router {
    origination_router(Arc::new(origination))
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("encode")))
        .expect("request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

#[tokio::test]
async fn borrower_flow_over_http() {
    let (origination, _) = build_origination();
    let router = router_for(origination);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/borrowers",
            serde_json::to_value(borrower_draft("http")).expect("draft json"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let borrower = read_json_body(response).await;
    let borrower_id = borrower["id"].as_str().expect("id").to_string();
    assert_eq!(borrower["userId"], "user-http");

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/borrowers/{borrower_id}/loans"),
            json!({
                "loanAmount": 50000.0,
                "loanTermMonths": 36,
                "interestRate": 6.5,
                "purpose": "debt consolidation",
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let application = read_json_body(response).await;
    assert_eq!(application["status"], "PENDING");
    assert_eq!(application["loanType"], "PERSONAL");
    assert_eq!(application["monthlyPayment"], 1532.45);

    let response = router
        .clone()
        .oneshot(get_request(&format!("/api/borrowers/{borrower_id}/loans")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let listed = read_json_body(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let response = router
        .oneshot(get_request("/api/borrowers/user/user-http"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn submit_below_minimum_is_unprocessable() {
    let (origination, _) = build_origination();
    let (borrower, _) = seed(&origination, "http-small").await;
    let router = router_for(origination);

    let response = router
        .oneshot(json_request(
            Method::POST,
            &format!("/api/borrowers/{}/loans", borrower.id),
            json!({
                "loanAmount": 500.0,
                "loanTermMonths": 36,
                "interestRate": 6.5,
                "purpose": "debt consolidation",
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().is_some_and(|msg| msg.contains("500")));
}

#[tokio::test]
async fn officer_status_updates_map_errors() {
    let (origination, _) = build_origination();
    let (_, application) = seed(&origination, "http-status").await;
    let router = router_for(origination);
    let uri = format!("/admin/loans/{}/status", application.id);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &uri,
            json!({ "status": "REJECTED", "updatedBy": "officer.kim" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &uri,
            json!({ "status": "APPROVED", "updatedBy": "officer.kim" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let approved = read_json_body(response).await;
    assert_eq!(approved["status"], "APPROVED");
    assert_eq!(approved["statusUpdatedBy"], "officer.kim");

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &uri,
            json!({ "status": "APPROVED", "updatedBy": "officer.kim" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router
        .oneshot(json_request(
            Method::PUT,
            &uri,
            json!({ "status": "ARCHIVED", "updatedBy": "officer.kim" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn admin_listing_filters_by_status() {
    let (origination, _) = build_origination();
    let (borrower, first) = seed(&origination, "http-list").await;
    origination
        .loans()
        .submit(&borrower.id, loan_request(7_500.0))
        .await
        .expect("second");
    origination
        .loans()
        .transition(&first.id, LoanStatus::UnderReview, "officer.kim", None)
        .await
        .expect("review");
    let router = router_for(origination);

    let response = router
        .clone()
        .oneshot(get_request("/admin/loans?status=UNDER_REVIEW"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["id"], first.id.0.as_str());

    let response = router
        .clone()
        .oneshot(get_request("/admin/loans?status=ALL"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let response = router
        .oneshot(get_request("/admin/loans?status=SHELVED"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn score_route_degrades_without_scoring_service() {
    let (origination, _) = build_origination();
    let (_, application) = seed(&origination, "http-score").await;
    let router = router_for(origination);

    let response = router
        .clone()
        .oneshot(get_request(&format!("/admin/loans/{}/score", application.id)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "SERVICE_DOWN");

    let response = router
        .oneshot(get_request("/admin/loans/loan-missing/score"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn score_route_returns_available_score() {
    let (origination, _) = build_origination();
    let (_, application) = seed(&origination, "http-scored").await;
    let origination =
        origination.with_scoring(ScoringClient::new(Arc::new(ScriptedScores::scoring(655))));
    let router = router_for(origination);

    let response = router
        .oneshot(get_request(&format!("/admin/loans/{}/score", application.id)))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "AVAILABLE");
    assert_eq!(body["scoreGrade"], "GOOD");
    assert_eq!(body["riskAssessment"], "MEDIUM");
}

#[tokio::test]
async fn loan_documents_route_includes_summary() {
    let (origination, _) = build_origination();
    let (borrower, application) = seed(&origination, "http-docs").await;
    let router = router_for(origination);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/borrowers/{}/documents", borrower.id),
            json!({
                "loanApplicationId": application.id.0,
                "documentType": "INCOME_PROOF",
                "fileName": "paystub.pdf",
                "fileSize": 52_000,
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let document = read_json_body(response).await;
    assert_eq!(document["contentType"], "application/pdf");

    let response = router
        .oneshot(get_request(&format!(
            "/admin/loans/{}/documents",
            application.id
        )))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["documents"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["summary"]["pending"], 1);
    assert_eq!(
        body["summary"]["missingRequired"],
        json!(["ID_PROOF", "INCOME_PROOF"])
    );
}

#[tokio::test]
async fn status_catalog_lists_allowed_targets() {
    let (origination, _) = build_origination();
    let router = router_for(origination);

    let response = router
        .clone()
        .oneshot(get_request("/admin/status/loan-statuses"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body[0]["status"], "PENDING");
    assert_eq!(
        body[0]["allowedTargets"],
        json!(["UNDER_REVIEW", "APPROVED", "REJECTED"])
    );
    assert_eq!(body[1]["allowedTargets"], json!(["APPROVED", "REJECTED"]));
    assert_eq!(body[2]["terminal"], true);

    let response = router
        .oneshot(get_request("/admin/status/document-statuses"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body[2]["status"], "VERIFIED");
}

#[tokio::test]
async fn calculator_quotes_payments() {
    let (origination, _) = build_origination();
    let router = router_for(origination);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/borrowers/calculate-loan",
            json!({ "loanAmount": 12000.0, "loanTermMonths": 12, "interestRate": 0.0 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let quote = read_json_body(response).await;
    assert_eq!(quote["monthlyPayment"], 1000.0);
    assert_eq!(quote["totalInterest"], 0.0);
}

#[tokio::test]
async fn calculator_rejects_impossible_loans() {
    let (origination, _) = build_origination();
    let router = router_for(origination);

    for body in [
        json!({ "loanAmount": 12000.0, "loanTermMonths": 0, "interestRate": 6.5 }),
        json!({ "loanAmount": 12000.0, "loanTermMonths": 7, "interestRate": 6.5 }),
        json!({ "loanAmount": 12000.0, "loanTermMonths": 36, "interestRate": 250.0 }),
        json!({ "loanAmount": -500.0, "loanTermMonths": 36, "interestRate": -12.0 }),
    ] {
        let response = router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/borrowers/calculate-loan",
                body.clone(),
            ))
            .await
            .expect("response");
        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "quote accepted for {body}"
        );
    }
}

#[tokio::test]
async fn repeated_profile_creation_answers_ok() {
    let (origination, _) = build_origination();
    let router = router_for(origination);
    let draft = serde_json::to_value(borrower_draft("twice")).expect("draft json");

    let response = router
        .clone()
        .oneshot(json_request(Method::POST, "/api/borrowers", draft.clone()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json_body(response).await;

    let response = router
        .oneshot(json_request(Method::POST, "/api/borrowers", draft))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let existing = read_json_body(response).await;
    assert_eq!(existing["id"], created["id"]);
}

#[tokio::test]
async fn borrower_loan_route_hides_other_borrowers_loans() {
    let (origination, _) = build_origination();
    let (owner, application) = seed(&origination, "owner").await;
    let (stranger, _) = seed(&origination, "stranger").await;
    let router = router_for(origination);

    let response = router
        .clone()
        .oneshot(get_request(&format!(
            "/api/borrowers/{}/loans/{}",
            owner.id, application.id
        )))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["id"], application.id.0.as_str());

    for uri in [
        format!("/api/borrowers/{}/loans/{}", stranger.id, application.id),
        format!("/api/borrowers/{}/loans/loan-missing", owner.id),
    ] {
        let response = router
            .clone()
            .oneshot(get_request(&uri))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn document_route_returns_single_document() {
    let (origination, _) = build_origination();
    let (borrower, application) = seed(&origination, "http-doc").await;
    let document = origination
        .documents()
        .upload(
            &borrower.id,
            upload(DocumentType::IdProof, "passport.png", Some(&application.id)),
        )
        .await
        .expect("uploaded");
    let router = router_for(origination);

    let response = router
        .clone()
        .oneshot(get_request(&format!("/admin/documents/{}", document.id)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["documentType"], "ID_PROOF");
    assert_eq!(body["status"], "PENDING");

    let response = router
        .oneshot(get_request("/admin/documents/doc-missing"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn borrower_scores_route_lists_every_application() {
    let (origination, _) = build_origination();
    let (borrower, first) = seed(&origination, "http-portfolio").await;
    let second = origination
        .loans()
        .submit(&borrower.id, loan_request(20_000.0))
        .await
        .expect("second application");
    let provider = ScriptedScores::scoring(655).failing_for(&first.id);
    let origination = origination.with_scoring(ScoringClient::new(Arc::new(provider)));
    let router = router_for(origination);

    let response = router
        .clone()
        .oneshot(get_request(&format!("/admin/borrowers/{}/scores", borrower.id)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(body[0]["applicationId"], second.id.0.as_str());
    assert_eq!(body[0]["status"], "AVAILABLE");
    assert_eq!(body[1]["applicationId"], first.id.0.as_str());
    assert_eq!(body[1]["status"], "SERVICE_DOWN");

    let response = router
        .oneshot(get_request("/admin/borrowers/bor-missing/scores"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn borrower_scores_degrade_without_scoring_service() {
    let (origination, _) = build_origination();
    let (borrower, application) = seed(&origination, "http-unscored").await;
    let router = router_for(origination);

    let response = router
        .oneshot(get_request(&format!("/admin/borrowers/{}/scores", borrower.id)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body[0]["applicationId"], application.id.0.as_str());
    assert_eq!(body[0]["status"], "SERVICE_DOWN");
}

#[tokio::test]
async fn score_filters_select_by_grade_and_risk() {
    let (origination, _) = build_origination();
    let (_, scored) = seed(&origination, "http-grade-a").await;
    let (_, failing) = seed(&origination, "http-grade-b").await;
    let provider = ScriptedScores::scoring(655).failing_for(&failing.id);
    let origination = origination.with_scoring(ScoringClient::new(Arc::new(provider)));
    let router = router_for(origination);

    let response = router
        .clone()
        .oneshot(get_request("/admin/scores/grade/good"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["applicationId"], scored.id.0.as_str());

    let response = router
        .clone()
        .oneshot(get_request("/admin/scores/grade/EXCELLENT"))
        .await
        .expect("response");
    assert_eq!(read_json_body(response).await, json!([]));

    let response = router
        .clone()
        .oneshot(get_request("/admin/scores/risk/MEDIUM"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["riskAssessment"], "MEDIUM");

    for uri in ["/admin/scores/grade/STELLAR", "/admin/scores/risk/EXTREME"] {
        let response = router
            .clone()
            .oneshot(get_request(uri))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
    }
}

#[tokio::test]
async fn score_filters_are_empty_without_scoring_service() {
    let (origination, _) = build_origination();
    seed(&origination, "http-grade-off").await;
    let router = router_for(origination);

    let response = router
        .oneshot(get_request("/admin/scores/risk/HIGH"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await, json!([]));
}

#[test]
fn error_mapping_covers_taxonomy() {
    let cases = [
        (
            LifecycleError::Validation(ValidationError::MissingPurpose),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            LifecycleError::IllegalTransition(IllegalTransition {
                entity: "loan application",
                from: "APPROVED",
                to: "REJECTED",
            }),
            StatusCode::CONFLICT,
        ),
        (
            LifecycleError::StaleStatus {
                entity: "document",
                id: "doc-000001".to_string(),
            },
            StatusCode::CONFLICT,
        ),
        (
            LifecycleError::NotFound {
                entity: "loan application",
                id: "loan-x".to_string(),
            },
            StatusCode::NOT_FOUND,
        ),
        (
            LifecycleError::Store(RepositoryError::Unavailable("offline".to_string())),
            StatusCode::SERVICE_UNAVAILABLE,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(error_response(error).status(), expected);
    }
}
