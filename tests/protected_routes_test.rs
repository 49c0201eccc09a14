mod common;

use actix_web::{http::header, http::StatusCode, test};

use common::{agent_token, token_with, TestApp};
use quotedesk_api::middleware::auth::StaffRole;

#[actix_rt::test]
async fn test_settings_without_auth_is_rejected() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/api/agency/settings").to_request();

    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_quotations_with_garbage_token_are_rejected() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/quotations")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
        .to_request();

    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_expired_token_is_rejected() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/catalog/hotels")
        .insert_header((
            header::AUTHORIZATION,
            token_with(StaffRole::Agent, "agency-1", -3600),
        ))
        .to_request();

    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_valid_token_reaches_handler() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/agency/settings")
        .insert_header((header::AUTHORIZATION, agent_token("agency-1")))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}
