mod common;

use axum::http::StatusCode;
use axum::Router;
use common::*;
use serde_json::{json, Value};

/// Seeds one supplier, two customers, two products (liter and piece),
/// three purchases and three sales spread over two months.
async fn seed(app: &Router, token: &str) {
    let (_, supplier) = request(
        app,
        "POST",
        "/api/suppliers",
        Some(token),
        Some(json!({ "name": "Oybek", "phone": "+998911112233" })),
    )
    .await;
    let supplier_id = supplier["id"].as_i64().unwrap();

    let (_, shop) = request(
        app,
        "POST",
        "/api/customers",
        Some(token),
        Some(json!({ "name": "Do'stlik Market", "type": "shop", "phone": "+998933334455" })),
    )
    .await;
    let (_, cafe) = request(
        app,
        "POST",
        "/api/customers",
        Some(token),
        Some(json!({ "name": "Cafe Navruz", "type": "cafe", "phone": "+998935556677" })),
    )
    .await;

    let (_, milk) = request(
        app,
        "POST",
        "/api/products",
        Some(token),
        Some(json!({ "name": "Milk", "unit": "liter", "pricePerUnit": 3.0 })),
    )
    .await;
    let (_, yogurt) = request(
        app,
        "POST",
        "/api/products",
        Some(token),
        Some(json!({ "name": "Yogurt cup", "unit": "piece", "pricePerUnit": 1.0 })),
    )
    .await;

    for (day, liters, price) in [
        ("2024-03-01", 100.0, 2.0),
        ("2024-03-02", 50.0, 2.0),
        ("2024-04-01", 80.0, 2.5),
    ] {
        request(
            app,
            "POST",
            "/api/milk-purchases",
            Some(token),
            Some(json!({
                "supplierId": supplier_id,
                "date": day,
                "quantityLiters": liters,
                "pricePerLiter": price
            })),
        )
        .await;
    }

    for (customer, product, day, quantity, price) in [
        (&shop, &milk, "2024-03-01", 40.0, 3.0),
        (&cafe, &milk, "2024-03-02", 20.0, 3.0),
        (&shop, &yogurt, "2024-04-02", 30.0, 1.0),
    ] {
        request(
            app,
            "POST",
            "/api/sales",
            Some(token),
            Some(json!({
                "customerId": customer["id"],
                "productId": product["id"],
                "date": day,
                "quantity": quantity,
                "pricePerUnit": price
            })),
        )
        .await;
    }
}

#[tokio::test]
async fn summary_reports_counts_totals_and_recents() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;
    seed(&app, &admin).await;

    let (status, body) = request(&app, "GET", "/api/dashboard/summary", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suppliers"], 1);
    assert_eq!(body["customers"], 2);
    assert_eq!(body["products"], 2);
    assert_eq!(body["milkPurchases"], 3);
    assert_eq!(body["sales"], 3);
    // 100*2 + 50*2 liters purchased; 40*3 + 20*3 + 30*1 revenue
    assert_eq!(body["totalMilkPurchased"], 230.0);
    assert_eq!(body["totalRevenue"], 210.0);

    let recents = body["recentMilkPurchases"].as_array().unwrap();
    assert_eq!(recents.len(), 3);
    assert_eq!(recents[0]["date"], "2024-04-01");
    assert_eq!(recents[0]["supplier"]["name"], "Oybek");

    let recent_sales = body["recentSales"].as_array().unwrap();
    assert_eq!(recent_sales[0]["date"], "2024-04-02");
    assert_eq!(recent_sales[0]["product"]["name"], "Yogurt cup");
}

#[tokio::test]
async fn ranged_dashboard_aggregates_inclusive_window() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;
    seed(&app, &admin).await;

    let (status, body) = request(
        &app,
        "GET",
        "/api/dashboard?from=2024-03-01&to=2024-03-31",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dateRange"]["from"], "2024-03-01");
    assert_eq!(body["dateRange"]["to"], "2024-03-31");

    let summary = &body["summary"];
    assert_eq!(summary["totalMilkPurchased"], 150.0);
    assert_eq!(summary["totalPurchaseCost"], 300.0);
    // only the liter product counts as milk sold
    assert_eq!(summary["totalMilkSold"], 60.0);
    assert_eq!(summary["totalSalesRevenue"], 180.0);
    assert_eq!(summary["grossProfit"], -120.0);

    let purchases = body["purchasesOverTime"].as_array().unwrap();
    assert_eq!(purchases.len(), 2);
    assert_eq!(purchases[0]["date"], "2024-03-01");
    assert_eq!(purchases[0]["totalLiters"], 100.0);

    let sales = body["salesOverTime"].as_array().unwrap();
    assert_eq!(sales[0]["totalLiters"], 40.0);
    assert_eq!(sales[0]["totalUnits"], 0.0);
    assert_eq!(sales[0]["totalQuantity"], 40.0);

    let suppliers = body["supplierBreakdown"].as_array().unwrap();
    assert_eq!(suppliers[0]["supplierName"], "Oybek");
    assert_eq!(suppliers[0]["totalLitersSupplied"], 150.0);

    let customers = body["customerBreakdown"].as_array().unwrap();
    assert_eq!(customers[0]["customerName"], "Do'stlik Market");
    assert_eq!(customers[0]["totalRevenue"], 120.0);
    assert_eq!(customers[0]["totalLitersBought"], 40.0);

    let products = body["productBreakdown"].as_array().unwrap();
    assert_eq!(products[0]["productName"], "Milk");
    assert_eq!(products[0]["unitsSold"], 60.0);
}

#[tokio::test]
async fn ranged_dashboard_validates_bounds() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;

    let (status, body) = request(&app, "GET", "/api/dashboard", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("from"));

    let (status, _) = request(
        &app,
        "GET",
        "/api/dashboard?from=2024-03-01&to=bogus",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = request(
        &app,
        "GET",
        "/api/dashboard?from=2024-04-01&to=2024-03-01",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("from"));
}

#[tokio::test]
async fn all_time_dashboard_reports_averages_and_trends() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;
    seed(&app, &admin).await;

    let (status, body) = request(&app, "GET", "/api/dashboard/all-time", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let summary = &body["summary"];
    assert_eq!(summary["totalMilkPurchased"], 230.0);
    assert_eq!(summary["totalPurchaseCost"], 500.0);
    assert_eq!(summary["totalSalesRevenue"], 210.0);

    let suppliers = body["supplierBreakdown"].as_array().unwrap();
    assert_eq!(suppliers[0]["totalTransactions"], 3);
    // 500 cost over 230 liters
    let avg = suppliers[0]["averagePricePerLiter"].as_f64().unwrap();
    assert!((avg - 500.0 / 230.0).abs() < 1e-9);

    let products = body["productBreakdown"].as_array().unwrap();
    let milk = products
        .iter()
        .find(|p| p["productName"] == "Milk")
        .unwrap();
    assert_eq!(milk["averagePricePerUnit"], 3.0);
    assert_eq!(milk["productUnit"], "liter");

    let trends = body["monthlyTrends"].as_array().unwrap();
    assert_eq!(trends.len(), 2);
    assert_eq!(trends[0]["month"], "2024-03");
    assert_eq!(trends[0]["purchaseCost"], 300.0);
    assert_eq!(trends[0]["salesRevenue"], 180.0);
    assert_eq!(trends[0]["profit"], -120.0);
    assert_eq!(trends[1]["month"], "2024-04");
}

#[tokio::test]
async fn empty_database_yields_zeroed_dashboard() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;

    let (status, body) = request(
        &app,
        "GET",
        "/api/dashboard?from=2024-01-01&to=2024-12-31",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["totalMilkPurchased"], 0.0);
    assert_eq!(body["summary"]["grossProfit"], 0.0);
    assert_eq!(body["purchasesOverTime"], Value::Array(vec![]));
    assert_eq!(body["supplierBreakdown"], Value::Array(vec![]));
}
