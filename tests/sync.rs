//! Tests for gateway-driven reconciliation and reversal, against a local
//! merchant-API stub.

mod common;

use axum::http::StatusCode;
use common::*;

#[tokio::test]
async fn sync_settles_confirmed_payment_as_paid() {
    let base_url = spawn_gateway_stub(
        serde_json::json!({ "error_code": 0, "payment_id": 9001, "payment_status": 2 }),
        serde_json::json!({ "error_code": 0 }),
    )
    .await;
    let (state, _dir) = create_test_app_state_with_gateway(&base_url);
    let payment = {
        let conn = state.db.get().unwrap();
        create_test_payment(&conn, 500)
    };

    let uri = format!("/payments/{}/sync", payment.merchant_trans_id);
    let (status, json) = post_json(app(state.clone()), &uri, serde_json::json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "paid");
    assert_eq!(json["gateway_payment_id"], "9001");

    let conn = state.db.get().unwrap();
    let stored = queries::get_payment_by_id(&conn, payment.id).unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Paid);
    assert_eq!(stored.gateway_payment_id.as_deref(), Some("9001"));
}

#[tokio::test]
async fn sync_cancels_payment_the_gateway_reports_reversed() {
    let base_url = spawn_gateway_stub(
        serde_json::json!({ "error_code": 0, "payment_id": 9002, "payment_status": -2 }),
        serde_json::json!({ "error_code": 0 }),
    )
    .await;
    let (state, _dir) = create_test_app_state_with_gateway(&base_url);
    let payment = {
        let conn = state.db.get().unwrap();
        create_test_payment(&conn, 500)
    };

    let uri = format!("/payments/{}/sync", payment.merchant_trans_id);
    let (status, json) = post_json(app(state.clone()), &uri, serde_json::json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "canceled");

    let conn = state.db.get().unwrap();
    let stored = queries::get_payment_by_id(&conn, payment.id).unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Canceled);
    assert_eq!(stored.gateway_payment_id.as_deref(), Some("9002"));
}

#[tokio::test]
async fn sync_leaves_in_flight_payment_pending() {
    // payment_status 1 is neither confirmed nor canceled
    let base_url = spawn_gateway_stub(
        serde_json::json!({ "error_code": 0, "payment_id": 9003, "payment_status": 1 }),
        serde_json::json!({ "error_code": 0 }),
    )
    .await;
    let (state, _dir) = create_test_app_state_with_gateway(&base_url);
    let payment = {
        let conn = state.db.get().unwrap();
        create_test_payment(&conn, 500)
    };

    let uri = format!("/payments/{}/sync", payment.merchant_trans_id);
    let (status, json) = post_json(app(state.clone()), &uri, serde_json::json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "pending");

    let conn = state.db.get().unwrap();
    let stored = queries::get_payment_by_id(&conn, payment.id).unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Pending);
    assert!(stored.gateway_payment_id.is_none());
}

#[tokio::test]
async fn sync_leaves_payment_pending_when_gateway_has_no_record() {
    let base_url = spawn_gateway_stub(
        serde_json::json!({ "error_code": -16, "error_note": "Transaction not found" }),
        serde_json::json!({ "error_code": 0 }),
    )
    .await;
    let (state, _dir) = create_test_app_state_with_gateway(&base_url);
    let payment = {
        let conn = state.db.get().unwrap();
        create_test_payment(&conn, 500)
    };

    let uri = format!("/payments/{}/sync", payment.merchant_trans_id);
    let (status, json) = post_json(app(state.clone()), &uri, serde_json::json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "pending");
}

#[tokio::test]
async fn reverse_acknowledged_by_gateway_cancels_pending_payment() {
    // No gateway id on record yet, so the handler looks it up first
    let base_url = spawn_gateway_stub(
        serde_json::json!({ "error_code": 0, "payment_id": 9001, "payment_status": 1 }),
        serde_json::json!({ "error_code": 0 }),
    )
    .await;
    let (state, _dir) = create_test_app_state_with_gateway(&base_url);
    let payment = {
        let conn = state.db.get().unwrap();
        create_test_payment(&conn, 500)
    };

    let uri = format!("/payments/{}/reverse", payment.merchant_trans_id);
    let (status, json) = post_json(app(state.clone()), &uri, serde_json::json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "canceled");
    assert_eq!(json["gateway_payment_id"], "9001");

    let conn = state.db.get().unwrap();
    let stored = queries::get_payment_by_id(&conn, payment.id).unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Canceled);
    assert_eq!(stored.gateway_payment_id.as_deref(), Some("9001"));
}

#[tokio::test]
async fn reverse_refused_by_gateway_keeps_payment_pending() {
    let base_url = spawn_gateway_stub(
        serde_json::json!({ "error_code": 0, "payment_id": 9001, "payment_status": 1 }),
        serde_json::json!({ "error_code": -5017, "error_note": "Reversal not allowed" }),
    )
    .await;
    let (state, _dir) = create_test_app_state_with_gateway(&base_url);
    let payment = {
        let conn = state.db.get().unwrap();
        create_test_payment(&conn, 500)
    };

    let uri = format!("/payments/{}/reverse", payment.merchant_trans_id);
    let (status, _) = post_json(app(state.clone()), &uri, serde_json::json!({})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let conn = state.db.get().unwrap();
    let stored = queries::get_payment_by_id(&conn, payment.id).unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Pending);
    assert!(stored.gateway_payment_id.is_none());
}
