//! Order placement, pricing and owner-scoped order queries.

use axum::http::StatusCode;
use serde_json::{Value, json};

use bodegon_integration_tests::{TestApp, TestUser};

async fn place(app: &TestApp, user: &TestUser, items: Value) -> (StatusCode, Value) {
    app.post(
        "/orders",
        Some(&user.token),
        &json!({"payment_mode": "cash", "order_items": items}),
    )
    .await
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .expect("array body")
        .iter()
        .map(|v| v["id"].as_i64().expect("id"))
        .collect()
}

// ============================================================================
// Placement
// ============================================================================

#[tokio::test]
async fn test_place_order_computes_totals() {
    let app = TestApp::new();
    let user = app.sample_user("user@bodegonasusalud.com").await;
    let ron = app.sample_product(&user, "Ron Cacique", 1500, None, &[]).await;
    let vino = app.sample_product(&user, "Vino", 10000, Some(20), &[]).await;

    let (status, body) = place(
        &app,
        &user,
        json!([
            {"product": ron.id.as_i32(), "quantity": 2},
            {"product": vino.id.as_i32(), "quantity": 3},
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"message": "Order created successfully"}));

    let (status, body) = app.get("/orders", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    let order = &body[0];
    assert_eq!(order["order_total"], "270.00");
    assert_eq!(order["order_status"], "Created");
    assert_eq!(order["payment_mode"], "cash");
    assert_eq!(order["is_paid"], false);
    assert!(order["shipped_date"].is_null());
    assert!(!order["tracking_number"].as_str().expect("tracking").is_empty());

    let items = order["order_items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["item_price"], "15.00");
    assert_eq!(items[0]["total_price"], "30.00");
    assert!(items[0]["discount"].is_null());
    assert_eq!(items[1]["item_price"], "100.00");
    assert_eq!(items[1]["discount"], "20");
    assert_eq!(items[1]["total_price"], "240.00");
    assert_eq!(items[1]["order"], order["id"]);
}

#[tokio::test]
async fn test_single_item_order() {
    let app = TestApp::new();
    let user = app.sample_user("user@bodegonasusalud.com").await;
    let ron = app.sample_product(&user, "Ron Cacique", 1500, None, &[]).await;

    let (status, _) = place(&app, &user, json!([{"product": ron.id.as_i32(), "quantity": 1}])).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, items) = app.get("/items", Some(&user.token)).await;
    assert_eq!(items.as_array().expect("array").len(), 1);
    assert_eq!(items[0]["product"], ron.id.as_i32());
    assert_eq!(items[0]["total_price"], "15.00");
}

#[tokio::test]
async fn test_order_items_keep_placement_price() {
    let app = TestApp::new();
    let user = app.sample_user("user@bodegonasusalud.com").await;
    let ron = app.sample_product(&user, "Ron Cacique", 1500, None, &[]).await;

    place(&app, &user, json!([{"product": ron.id.as_i32(), "quantity": 2}])).await;

    let (status, _) = app
        .patch(
            &format!("/products/{}", ron.id),
            Some(&user.token),
            &json!({"price": "99.00", "discount": "50"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/orders", Some(&user.token)).await;
    let item = &body[0]["order_items"][0];
    assert_eq!(item["item_price"], "15.00");
    assert!(item["discount"].is_null());
    assert_eq!(item["total_price"], "30.00");
    assert_eq!(body[0]["order_total"], "30.00");
}

#[tokio::test]
async fn test_missing_product_rolls_back_whole_order() {
    let app = TestApp::new();
    let user = app.sample_user("user@bodegonasusalud.com").await;
    let other = app.sample_user("other@bodegonasusalud.com").await;
    let ron = app.sample_product(&user, "Ron Cacique", 1500, None, &[]).await;
    let foreign = app.sample_product(&other, "Vino", 900, None, &[]).await;

    for missing in [9999, foreign.id.as_i32()] {
        let (status, _) = place(
            &app,
            &user,
            json!([
                {"product": ron.id.as_i32(), "quantity": 1},
                {"product": missing, "quantity": 1},
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "product {missing}");
    }

    let (_, orders) = app.get("/orders", Some(&user.token)).await;
    assert!(orders.as_array().expect("array").is_empty());
    let (_, items) = app.get("/items", Some(&user.token)).await;
    assert!(items.as_array().expect("array").is_empty());
}

#[tokio::test]
async fn test_invalid_submissions_name_the_field() {
    let app = TestApp::new();
    let user = app.sample_user("user@bodegonasusalud.com").await;
    let ron = app.sample_product(&user, "Ron Cacique", 1500, None, &[]).await;
    let product = ron.id.as_i32();

    let cases = [
        (json!({"payment_mode": "cash"}), "order_items"),
        (json!({"payment_mode": "cash", "order_items": []}), "order_items"),
        (
            json!({"order_items": [{"product": product, "quantity": 1}]}),
            "payment_mode",
        ),
        (
            json!({"payment_mode": "  ", "order_items": [{"product": product, "quantity": 1}]}),
            "payment_mode",
        ),
        (
            json!({"payment_mode": "cash", "order_items": [{"quantity": 1}]}),
            "order_items[0].product",
        ),
        (
            json!({"payment_mode": "cash", "order_items": [{"product": product, "quantity": 0}]}),
            "order_items[0].quantity",
        ),
        (
            json!({"payment_mode": "cash", "order_items": [
                {"product": product, "quantity": 1},
                {"product": product, "quantity": -2},
            ]}),
            "order_items[1].quantity",
        ),
    ];

    for (body, field) in cases {
        let (status, response) = app.post("/orders", Some(&user.token), &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response["field"], field, "{body}");
    }

    let (_, orders) = app.get("/orders", Some(&user.token)).await;
    assert!(orders.as_array().expect("array").is_empty());
}

#[tokio::test]
async fn test_out_of_range_amounts_are_rejected() {
    let app = TestApp::new();
    let user = app.sample_user("user@bodegonasusalud.com").await;

    let (status, body) = app
        .post(
            "/products",
            Some(&user.token),
            &json!({"name": "Reserva", "price": "79228162514264337593543950335"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "price");

    let reserva = app.sample_product(&user, "Reserva", 9_999_999_999, None, &[]).await;
    let (status, _) = place(&app, &user, json!([{"product": reserva.id.as_i32(), "quantity": 2}])).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = place(
        &app,
        &user,
        json!([
            {"product": reserva.id.as_i32(), "quantity": 1},
            {"product": reserva.id.as_i32(), "quantity": 1000},
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "order_items[1].quantity");

    let (_, orders) = app.get("/orders", Some(&user.token)).await;
    assert_eq!(ids(&orders).len(), 1);
    assert_eq!(orders[0]["order_total"], "199999999.98");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let user = app.sample_user("user@bodegonasusalud.com").await;

    let (status, body) = app
        .post("/orders", Some(&user.token), &json!("not an object"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_orders_are_scoped_and_filterable() {
    let app = TestApp::new();
    let user = app.sample_user("user@bodegonasusalud.com").await;
    let other = app.sample_user("other@bodegonasusalud.com").await;
    let ron = app.sample_product(&user, "Ron Cacique", 1500, None, &[]).await;
    let vino = app.sample_product(&other, "Vino", 900, None, &[]).await;

    for _ in 0..3 {
        place(&app, &user, json!([{"product": ron.id.as_i32(), "quantity": 1}])).await;
    }
    place(&app, &other, json!([{"product": vino.id.as_i32(), "quantity": 1}])).await;

    let (_, mine) = app.get("/orders", Some(&user.token)).await;
    let mine = ids(&mine);
    assert_eq!(mine.len(), 3);
    assert!(mine.windows(2).all(|w| w[0] > w[1]), "newest first: {mine:?}");

    let (_, theirs) = app.get("/orders", Some(&other.token)).await;
    let foreign = ids(&theirs)[0];
    assert!(!mine.contains(&foreign));

    let (_, filtered) = app
        .get(
            &format!("/orders?order={},{foreign}", mine[2]),
            Some(&user.token),
        )
        .await;
    assert_eq!(ids(&filtered), vec![mine[2]]);

    let (status, body) = app.get("/orders?order=1,abc", Some(&user.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "order");

    let (status, body) = app
        .get(&format!("/orders/{}", mine[0]), Some(&user.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], mine[0]);

    let (status, _) = app
        .get(&format!("/orders/{foreign}"), Some(&user.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_items_are_scoped_and_filterable() {
    let app = TestApp::new();
    let user = app.sample_user("user@bodegonasusalud.com").await;
    let other = app.sample_user("other@bodegonasusalud.com").await;
    let ron = app.sample_product(&user, "Ron Cacique", 1500, None, &[]).await;
    let vino = app.sample_product(&other, "Vino", 900, None, &[]).await;

    place(&app, &user, json!([{"product": ron.id.as_i32(), "quantity": 1}])).await;
    place(&app, &user, json!([{"product": ron.id.as_i32(), "quantity": 2}])).await;
    place(&app, &other, json!([{"product": vino.id.as_i32(), "quantity": 1}])).await;

    let (status, items) = app.get("/items", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    let items = items.as_array().expect("array").clone();
    assert_eq!(items.len(), 2);

    let first_order = items[0]["order"].as_i64().expect("order id");
    let (_, filtered) = app
        .get(&format!("/items?order={first_order}"), Some(&user.token))
        .await;
    let filtered = filtered.as_array().expect("array");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["order"], first_order);

    let (status, _) = app.get("/items?order=x", Some(&user.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let item_id = items[0]["id"].as_i64().expect("item id");
    let (status, body) = app
        .get(&format!("/items/{item_id}"), Some(&user.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], item_id);

    let (_, theirs) = app.get("/items", Some(&other.token)).await;
    let foreign_item = theirs[0]["id"].as_i64().expect("item id");
    let (status, _) = app
        .get(&format!("/items/{foreign_item}"), Some(&user.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trailing_slash_routes() {
    let app = TestApp::new();
    let user = app.sample_user("user@bodegonasusalud.com").await;
    let rones = app.sample_category(&user, "Rones").await;
    let ron = app
        .sample_product(&user, "Ron Cacique", 1500, None, &[rones.id])
        .await;

    let (status, _) = app
        .post(
            "/orders/",
            Some(&user.token),
            &json!({"payment_mode": "cash", "order_items": [{"product": ron.id.as_i32(), "quantity": 1}]}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    for uri in ["/orders/", "/items/", "/products/", "/categories/"] {
        let (status, body) = app.get(uri, Some(&user.token)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body.as_array().expect("array").len(), 1, "{uri}");
    }
}
