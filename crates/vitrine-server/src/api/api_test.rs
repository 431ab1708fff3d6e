use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use std::time::Duration;
use tower::ServiceExt;

const ADMIN_KEY: &str = "test-admin-key";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

/// App with bearer auth enabled and a single admin key.
fn secured_app(pool: sqlx::PgPool) -> Router {
    let auth = AuthState::from_keys(ADMIN_KEY, "test-salt", false).expect("auth");
    build_app(AppState { pool }, auth, default_rate_limit_state())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_KEY}"))
        .body(Body::empty())
        .expect("request")
}

fn admin_json(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_KEY}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).expect("json parse")
    };
    (status, json)
}

async fn create_category(app: &Router, name: &str) -> i64 {
    let (status, json) = send(
        app,
        admin_json(
            Method::POST,
            "/api/v1/categories",
            &serde_json::json!({ "name": name }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create category: {json}");
    json["data"]["id"].as_i64().expect("category id")
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

#[test]
fn normalize_limit_only_clamps_supplied_values() {
    assert_eq!(normalize_limit(None), None);
    assert_eq!(normalize_limit(Some(0)), Some(1));
    assert_eq!(normalize_limit(Some(1_000)), Some(200));
    assert_eq!(normalize_limit(Some(25)), Some(25));
}

#[test]
fn lenient_parsing_drops_bad_values() {
    assert_eq!(lenient::<i64>(Some(" 7 ")), Some(7));
    assert_eq!(lenient::<i64>(Some("seven")), None);
    assert_eq!(lenient::<i64>(Some("")), None);
    assert_eq!(lenient_bool(Some("Yes")), Some(true));
    assert_eq!(lenient_bool(Some("0")), Some(false));
    assert_eq!(lenient_bool(Some("perhaps")), None);
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("conflict", StatusCode::CONFLICT),
        ("unauthorized", StatusCode::UNAUTHORIZED),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, expected) in cases {
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), expected, "code {code}");
    }
}

#[test]
fn non_numeric_ids_are_not_found() {
    let err = parse_id("req-1", "abc").expect_err("should reject");
    assert_eq!(err.error.code, "not_found");
    assert_eq!(parse_id("req-1", "42").expect("numeric id"), 42);
}

#[test]
fn missing_payload_fields_are_validation_errors() {
    let err = map_payload_error("req-1", &PayloadError::Missing { field: "name" });
    assert_eq!(err.error.code, "validation_error");
    assert_eq!(err.error.message, "name is required");
}

#[test]
fn patch_null_clears_while_missing_key_keeps() {
    let cleared: categories::UpdateCategoryRequest =
        serde_json::from_str(r#"{"icon": null}"#).expect("valid body");
    assert_eq!(cleared.icon, Some(None));

    let untouched: categories::UpdateCategoryRequest =
        serde_json::from_str(r#"{"name": "Adesivos"}"#).expect("valid body");
    assert_eq!(untouched.icon, None);

    let set: banners::BannerRequest =
        serde_json::from_str(r#"{"image_mobile": "/m.jpg"}"#).expect("valid body");
    assert_eq!(set.image_mobile, Some(Some("/m.jpg".to_string())));
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn health_is_public(pool: sqlx::PgPool) {
    let app = secured_app(pool);
    let (status, json) = send(&app, get("/api/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert!(json["meta"]["request_id"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn writes_require_a_valid_key(pool: sqlx::PgPool) {
    let app = secured_app(pool);

    let anonymous = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/categories")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"Adesivos"}"#))
        .expect("request");
    let (status, json) = send(&app, anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");

    let wrong_key = Request::builder()
        .uri("/api/v1/categories")
        .header(header::AUTHORIZATION, "Bearer not-the-key")
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(&app, wrong_key).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(&app, get("/api/v1/categories")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().map(Vec::len), Some(0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn admin_reads_reject_anonymous_callers(pool: sqlx::PgPool) {
    let app = secured_app(pool);

    for uri in [
        "/api/v1/dashboard/stats",
        "/api/v1/coupons",
        "/api/v1/exit-popup/configs",
    ] {
        let (status, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        let (status, _) = send(&app, admin_get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn product_json_write_then_public_reads(pool: sqlx::PgPool) {
    let app = secured_app(pool);
    let category_id = create_category(&app, "Cartões de Visita").await;

    let (status, json) = send(
        &app,
        admin_json(
            Method::POST,
            "/api/v1/products",
            &serde_json::json!({
                "name": "Cartão Couché 300g",
                "category": category_id,
                "production_time": "2 dias úteis",
                "is_featured": true,
                "variants": [
                    { "name": "100un", "price": "45,00" },
                    { "name": "", "price": "10" },
                    { "name": "500un", "price": 120.5 }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    let product_id = json["data"]["id"].as_i64().expect("product id");
    assert_eq!(json["data"]["slug"], "cartao-couche-300g");
    assert_eq!(json["data"]["category_slug"], "cartoes-de-visita");
    assert_eq!(json["data"]["variants"].as_array().map(Vec::len), Some(2));

    let (status, json) = send(&app, get("/api/v1/products/slug/cartao-couche-300g")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["views_count"], 1);

    let (status, json) = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/products/{product_id}/increment-view"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "view recorded");
    assert_eq!(json["data"]["total"], 2);

    let (status, json) = send(&app, get("/api/v1/products?is_featured=true&min_price=100")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));

    let (status, json) = send(&app, get("/api/v1/products?min_price=banana&limit=x")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_multipart_write_ignores_file_parts(pool: sqlx::PgPool) {
    let app = secured_app(pool);
    let category_id = create_category(&app, "Adesivos").await;

    let boundary = "vitrine-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"name\"\r\n\r\n\
         Adesivo Redondo\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"category\"\r\n\r\n\
         {category_id}\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"variants_json\"\r\n\r\n\
         [{{\"name\":\"50un\",\"price\":\"30.00\"}}]\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         PNGDATA\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/products")
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_KEY}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("request");

    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["data"]["slug"], "adesivo-redondo");
    assert_eq!(json["data"]["image"], "");
    assert_eq!(json["data"]["variants"][0]["price"], "30.00");
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_write_errors_map_to_client_statuses(pool: sqlx::PgPool) {
    let app = secured_app(pool);
    let category_id = create_category(&app, "Flyers").await;

    let (status, json) = send(
        &app,
        admin_json(Method::POST, "/api/v1/products", &serde_json::json!({ "name": "Sem categoria" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let (status, _) = send(
        &app,
        admin_json(
            Method::POST,
            "/api/v1/products",
            &serde_json::json!({ "name": "Fantasma", "category": 999_999 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = serde_json::json!({ "name": "Flyer", "category": category_id, "slug": "flyer" });
    let (status, _) = send(&app, admin_json(Method::POST, "/api/v1/products", &body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, json) = send(&app, admin_json(Method::POST, "/api/v1/products", &body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "conflict");

    let (status, _) = send(
        &app,
        admin_json(Method::PATCH, "/api/v1/products/999999", &serde_json::json!({ "name": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../migrations")]
async fn inactive_products_are_visible_to_admins_only(pool: sqlx::PgPool) {
    let app = secured_app(pool);
    let category_id = create_category(&app, "Rascunhos").await;

    let (_, json) = send(
        &app,
        admin_json(
            Method::POST,
            "/api/v1/products",
            &serde_json::json!({ "name": "Oculto", "category": category_id, "is_active": false }),
        ),
    )
    .await;
    let product_id = json["data"]["id"].as_i64().expect("product id");

    let (status, _) = send(&app, get(&format!("/api/v1/products/{product_id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = send(&app, get("/api/v1/products?include_inactive=true")).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(0));

    let (_, json) = send(&app, admin_get("/api/v1/products?include_inactive=true")).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, admin_get(&format!("/api/v1/products/{product_id}"))).await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Storefront content
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn coupon_validation_is_case_insensitive(pool: sqlx::PgPool) {
    let app = secured_app(pool);

    let (status, _) = send(
        &app,
        admin_json(
            Method::POST,
            "/api/v1/coupons",
            &serde_json::json!({ "code": "PROMO15", "discount_percentage": 15 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(&app, get("/api/v1/coupons/validate?code=promo15")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["code"], "PROMO15");
    assert_eq!(json["data"]["discount_percentage"], 15);

    let (status, json) = send(&app, get("/api/v1/coupons/validate?code=nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "invalid coupon");

    let (status, _) = send(
        &app,
        admin_json(
            Method::POST,
            "/api/v1/coupons",
            &serde_json::json!({ "code": "BAD", "discount_percentage": 0 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../migrations")]
async fn company_config_round_trips_through_put(pool: sqlx::PgPool) {
    let app = secured_app(pool);

    let (status, _) = send(&app, get("/api/v1/company")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(
        &app,
        admin_json(
            Method::PUT,
            "/api/v1/company",
            &serde_json::json!({ "whatsapp": "5511988887777", "instagram": "@vitrine" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["name"], "Cloud Design");

    let (status, json) = send(&app, get("/api/v1/company")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["instagram"], "@vitrine");
}

#[sqlx::test(migrations = "../../migrations")]
async fn banners_list_active_in_sort_order(pool: sqlx::PgPool) {
    let app = secured_app(pool);

    for (title, order, active) in [("Second", 2, true), ("First", 1, true), ("Hidden", 0, false)] {
        let (status, json) = send(
            &app,
            admin_json(
                Method::POST,
                "/api/v1/banners",
                &serde_json::json!({
                    "title": title,
                    "image": format!("/media/{title}.jpg"),
                    "order": order,
                    "is_active": active
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
    }

    let (_, json) = send(&app, get("/api/v1/banners")).await;
    let titles: Vec<&str> = json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|b| b["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["First", "Second"]);

    let (status, _) = send(
        &app,
        admin_json(Method::POST, "/api/v1/banners", &serde_json::json!({ "title": "No image" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../migrations")]
async fn dashboard_stats_on_empty_catalog(pool: sqlx::PgPool) {
    let app = secured_app(pool);
    let (status, json) = send(&app, admin_get("/api/v1/dashboard/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total_catalog_views"], 0);
    assert_eq!(json["data"]["ranking"].as_array().map(Vec::len), Some(0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn exit_popup_current_is_null_until_activated(pool: sqlx::PgPool) {
    let app = secured_app(pool);

    let (status, json) = send(&app, get("/api/v1/exit-popup")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"].is_null());

    let (status, json) = send(
        &app,
        admin_json(
            Method::POST,
            "/api/v1/exit-popup/configs",
            &serde_json::json!({
                "name": "Black Friday",
                "coupon_code": "FICA10",
                "minimum_cart_value": "50.00",
                "is_active": true
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");

    let (_, json) = send(&app, get("/api/v1/exit-popup")).await;
    assert_eq!(json["data"]["coupon_code"], "FICA10");
    assert_eq!(json["data"]["timer_minutes"], 15);
}

#[sqlx::test(migrations = "../../migrations")]
async fn repeated_query_keys_do_not_reject_listings(pool: sqlx::PgPool) {
    let app = secured_app(pool);
    let category_id = create_category(&app, "Etiquetas").await;
    let (status, _) = send(
        &app,
        admin_json(
            Method::POST,
            "/api/v1/products",
            &serde_json::json!({
                "name": "Etiqueta Vinil",
                "category": category_id,
                "variants": [{ "name": "100un", "price": "85" }]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(&app, get("/api/v1/products?min_price=80&min_price=90")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().map(Vec::len), Some(0));

    let (status, json) = send(
        &app,
        get("/api/v1/products?category=nope&category__slug=etiquetas"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));

    for uri in [
        "/api/v1/kits?search=a&search=b",
        "/api/v1/banners?include_inactive=1&include_inactive=0",
    ] {
        let (status, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
    let (status, _) = send(&app, admin_get("/api/v1/dashboard/stats?limit=5&limit=x")).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "../../migrations")]
async fn patch_with_null_clears_optional_references(pool: sqlx::PgPool) {
    let app = secured_app(pool);

    let (status, json) = send(
        &app,
        admin_json(
            Method::POST,
            "/api/v1/categories",
            &serde_json::json!({ "name": "Brindes", "icon": "icons/brinde.svg" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = json["data"]["id"].as_i64().expect("category id");

    let uri = format!("/api/v1/categories/{category_id}");
    let (status, json) = send(
        &app,
        admin_json(Method::PATCH, &uri, &serde_json::json!({ "name": "Brindes e Mimos" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["icon"], "icons/brinde.svg");

    let (status, json) = send(
        &app,
        admin_json(Method::PATCH, &uri, &serde_json::json!({ "icon": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["icon"].is_null());

    let (_, json) = send(&app, get(&uri)).await;
    assert!(json["data"]["icon"].is_null());

    let (status, json) = send(
        &app,
        admin_json(
            Method::POST,
            "/api/v1/banners",
            &serde_json::json!({
                "title": "Promo",
                "image": "/media/promo.jpg",
                "image_mobile": "/media/promo-m.jpg"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let banner_id = json["data"]["id"].as_i64().expect("banner id");

    let (status, json) = send(
        &app,
        admin_json(
            Method::PATCH,
            &format!("/api/v1/banners/{banner_id}"),
            &serde_json::json!({ "image_mobile": null }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["image_mobile"].is_null());
    assert_eq!(json["data"]["image"], "/media/promo.jpg");
}
