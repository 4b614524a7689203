mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn supplier_crud_lifecycle() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;

    let (status, created) = request(
        &app,
        "POST",
        "/api/suppliers",
        Some(&admin),
        Some(json!({ "name": "Karim", "phone": "+998901234567", "notes": "morning rounds" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["name"], "Karim");
    assert_eq!(created["notes"], "morning rounds");
    assert!(created["createdAt"].is_string());

    let (status, body) = request(&app, "GET", "/api/suppliers", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/api/suppliers/{}", id),
        Some(&admin),
        Some(json!({ "name": "Karim aka", "phone": "+998901234567" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Karim aka");
    // notes omitted on update clears them
    assert!(updated.get("notes").is_none());

    let (status, body) = request(
        &app,
        "DELETE",
        &format!("/api/suppliers/{}", id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = request(
        &app,
        "GET",
        &format!("/api/suppliers/{}", id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn customer_type_field_round_trips() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;

    let (status, created) = request(
        &app,
        "POST",
        "/api/customers",
        Some(&admin),
        Some(json!({ "name": "Do'stlik Market", "type": "shop", "phone": "+998933334455" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["type"], "shop");
    assert!(created.get("kind").is_none());
}

#[tokio::test]
async fn validation_errors_are_bad_requests_with_message() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/suppliers",
        Some(&admin),
        Some(json!({ "name": "", "phone": "+998900000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, _) = request(
        &app,
        "POST",
        "/api/products",
        Some(&admin),
        Some(json!({ "name": "Milk", "unit": "liter", "pricePerUnit": -1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn milk_purchase_total_is_recomputed_server_side() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;

    let (_, supplier) = request(
        &app,
        "POST",
        "/api/suppliers",
        Some(&admin),
        Some(json!({ "name": "Oybek", "phone": "+998911112233" })),
    )
    .await;
    let supplier_id = supplier["id"].as_i64().unwrap();

    // the client-sent total is bogus on purpose
    let (status, purchase) = request(
        &app,
        "POST",
        "/api/milk-purchases",
        Some(&admin),
        Some(json!({
            "supplierId": supplier_id,
            "date": "2024-03-15",
            "quantityLiters": 120.0,
            "pricePerLiter": 2.5,
            "total": 99999.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(purchase["total"], 300.0);
    assert_eq!(purchase["date"], "2024-03-15");
    assert_eq!(purchase["supplier"]["name"], "Oybek");

    let id = purchase["id"].as_i64().unwrap();
    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/api/milk-purchases/{}", id),
        Some(&admin),
        Some(json!({
            "supplierId": supplier_id,
            "date": "2024-03-16",
            "quantityLiters": 100.0,
            "pricePerLiter": 3.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["total"], 300.0);
    assert_eq!(updated["date"], "2024-03-16");
}

#[tokio::test]
async fn sale_embeds_customer_and_product() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;

    let (_, customer) = request(
        &app,
        "POST",
        "/api/customers",
        Some(&admin),
        Some(json!({ "name": "Cafe Navruz", "type": "cafe", "phone": "+998935556677" })),
    )
    .await;
    let (_, product) = request(
        &app,
        "POST",
        "/api/products",
        Some(&admin),
        Some(json!({ "name": "Milk", "unit": "liter", "pricePerUnit": 3.0 })),
    )
    .await;

    let (status, sale) = request(
        &app,
        "POST",
        "/api/sales",
        Some(&admin),
        Some(json!({
            "customerId": customer["id"],
            "productId": product["id"],
            "date": "2024-03-15",
            "quantity": 10.0,
            "pricePerUnit": 3.5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sale["total"], 35.0);
    assert_eq!(sale["customer"]["name"], "Cafe Navruz");
    assert_eq!(sale["product"]["unit"], "liter");
}

#[tokio::test]
async fn sale_with_unknown_references_is_rejected() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/sales",
        Some(&admin),
        Some(json!({
            "customerId": 999,
            "productId": 999,
            "date": "2024-03-15",
            "quantity": 1.0,
            "pricePerUnit": 1.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("does not exist"));
}

#[tokio::test]
async fn referenced_master_data_cannot_be_deleted() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;

    let (_, supplier) = request(
        &app,
        "POST",
        "/api/suppliers",
        Some(&admin),
        Some(json!({ "name": "Oybek", "phone": "+998911112233" })),
    )
    .await;
    let supplier_id = supplier["id"].as_i64().unwrap();
    request(
        &app,
        "POST",
        "/api/milk-purchases",
        Some(&admin),
        Some(json!({
            "supplierId": supplier_id,
            "date": "2024-03-15",
            "quantityLiters": 10.0,
            "pricePerLiter": 2.0
        })),
    )
    .await;

    let (status, body) = request(
        &app,
        "DELETE",
        &format!("/api/suppliers/{}", supplier_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn transaction_lists_are_newest_first() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;

    let (_, supplier) = request(
        &app,
        "POST",
        "/api/suppliers",
        Some(&admin),
        Some(json!({ "name": "Oybek", "phone": "+998911112233" })),
    )
    .await;
    let supplier_id = supplier["id"].as_i64().unwrap();

    for day in ["2024-03-10", "2024-03-12", "2024-03-11"] {
        request(
            &app,
            "POST",
            "/api/milk-purchases",
            Some(&admin),
            Some(json!({
                "supplierId": supplier_id,
                "date": day,
                "quantityLiters": 10.0,
                "pricePerLiter": 2.0
            })),
        )
        .await;
    }

    let (status, body) = request(&app, "GET", "/api/milk-purchases", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-03-12", "2024-03-11", "2024-03-10"]);
}
