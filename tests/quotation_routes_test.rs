mod common;

use actix_web::{http::header, http::StatusCode, test};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use common::{admin_token, agent_token, offline_quotations, TestApp};

fn submission(days: Value) -> Value {
    json!({
        "client_id": "client-42",
        "destination_id": "dest-goa",
        "location_id": "loc-panaji",
        "start_date": "2026-12-20",
        "end_date": "2026-12-22",
        "travelers": { "adults": 2, "children": 1 },
        "days": days,
        "custom_activities": [{
            "name": "Private dinner cruise",
            "price": "2500",
            "days": [3]
        }]
    })
}

fn standard_day() -> Value {
    json!([{
        "day": 1,
        "hotel": { "hotel_id": "hotel-1", "name": "Sea Breeze" },
        "room_selections": [{
            "room": {
                "id": "room-deluxe",
                "room_type": "Deluxe",
                "base_price": "5000",
                "base_occupancy": 2,
                "extra_bed_price": "1500",
                "child_with_bed_price": "1000"
            },
            "room_count": 1,
            "occupancy": { "adults": 2, "children_with_bed": 1 }
        }],
        "meals": [{
            "meal_id": "meal-thali",
            "name": "Veg thali",
            "meal_type": "lunch",
            "price": "300",
            "quantity": 3
        }]
    }])
}

fn amount(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[actix_web::test]
async fn test_preview_uses_agency_pricing() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::put()
        .uri("/api/agency/settings/pricing")
        .insert_header((header::AUTHORIZATION, admin_token("agency-1")))
        .set_json(&json!({
            "markup_percentage": "20",
            "gst_percentage": "5",
            "discount_amount": "100"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::post()
        .uri("/api/quotations/preview")
        .insert_header((header::AUTHORIZATION, agent_token("agency-1")))
        .set_json(&submission(standard_day()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    let totals = &body["data"]["display_totals"];
    // rooms 6000 + meals 900 + cruise 2500
    assert_eq!(amount(&totals["subtotal"]), Decimal::from(9400));
    assert_eq!(amount(&totals["markup_amount"]), Decimal::from(1880));
    assert_eq!(amount(&totals["gst_amount"]), Decimal::from(564));
    assert_eq!(amount(&totals["grand_total"]), Decimal::from(11744));
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_preview_rejects_day_outside_trip() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/quotations/preview")
        .insert_header((header::AUTHORIZATION, agent_token("agency-1")))
        .set_json(&submission(json!([{ "day": 9 }])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_DAY_KEY");
}

#[actix_web::test]
async fn test_preview_requires_an_adult() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let mut payload = submission(json!([]));
    payload["travelers"] = json!({ "adults": 0, "children": 2 });

    let req = test::TestRequest::post()
        .uri("/api/quotations/preview")
        .insert_header((header::AUTHORIZATION, agent_token("agency-1")))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_confirming_a_day_with_unconfirmed_rooms_conflicts() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let mut days = standard_day();
    days[0]["confirmed"] = json!(true);

    let req = test::TestRequest::post()
        .uri("/api/quotations/preview")
        .insert_header((header::AUTHORIZATION, agent_token("agency-1")))
        .set_json(&submission(days))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_preview_rejects_negative_meal_price() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let mut days = standard_day();
    days[0]["meals"][0]["price"] = json!("-5000");

    let req = test::TestRequest::post()
        .uri("/api/quotations/preview")
        .insert_header((header::AUTHORIZATION, agent_token("agency-1")))
        .set_json(&submission(days))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_preview_rejects_oversized_room_count() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let mut days = standard_day();
    days[0]["room_selections"][0]["room_count"] = json!(u32::MAX);

    let req = test::TestRequest::post()
        .uri("/api/quotations/preview")
        .insert_header((header::AUTHORIZATION, agent_token("agency-1")))
        .set_json(&submission(days))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_double_submit_of_a_new_quotation_conflicts() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app().app_data(offline_quotations())).await;

    // Same key the create handler takes for this agent.
    let first = test_app
        .context
        .saves
        .enter("create:agency-1:test_user_123")
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/quotations")
        .insert_header((header::AUTHORIZATION, agent_token("agency-1")))
        .set_json(&submission(standard_day()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "STATE_INVARIANT_ERROR");

    drop(first);
    let req = test::TestRequest::post()
        .uri("/api/quotations")
        .insert_header((header::AUTHORIZATION, agent_token("agency-1")))
        .set_json(&submission(standard_day()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_ne!(resp.status(), StatusCode::CONFLICT);
    assert!(!test_app.context.saves.is_in_flight("create:agency-1:test_user_123"));
}

#[actix_web::test]
async fn test_concurrent_save_of_the_same_quotation_conflicts() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app().app_data(offline_quotations())).await;

    let _first = test_app.context.saves.enter("save:agency-1:q-17").unwrap();

    let req = test::TestRequest::put()
        .uri("/api/quotations/q-17")
        .insert_header((header::AUTHORIZATION, agent_token("agency-1")))
        .set_json(&submission(standard_day()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Another agency's quotation with the same id is a different action.
    assert!(!test_app.context.saves.is_in_flight("save:agency-2:q-17"));
}
