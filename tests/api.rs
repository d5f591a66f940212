//! End-to-end tests against a live PostgreSQL database.
//!
//! These run only when `DATABASE_URL` is set; without it each test exits
//! early. Migrations run on connect and every test seeds uniquely named
//! records, so the tests can share a database and run in any order.

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use dealership_crm_server::{
    AppState, app_router, config::Config, db, models::api_key::generate_key,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    app: axum::Router,
    pool: db::DbPool,
    key: String,
    secret: String,
}

/// Connect, migrate, and seed a full-permission key for the harness.
async fn test_app() -> Option<TestApp> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database-backed test");
        return None;
    };
    let pool = db::create_pool(&url).await.expect("database reachable");
    db::run_migrations(&pool).await.expect("migrations apply");

    let generated = generate_key();
    sqlx::query("INSERT INTO api_keys (name, key, secret_hash, permissions) VALUES ($1, $2, $3, $4)")
        .bind("test-harness")
        .bind(&generated.key)
        .bind(&generated.secret_hash)
        .bind(vec!["full".to_string()])
        .execute(&pool)
        .await
        .expect("seed harness key");

    let state = AppState {
        pool: pool.clone(),
        config: Config {
            database_url: url,
            server_port: 0,
            token_secret: "test-secret".into(),
            token_ttl_secs: 900,
        },
    };
    Some(TestApp {
        app: app_router(state),
        pool,
        key: generated.key,
        secret: generated.secret,
    })
}

impl TestApp {
    /// Send an authenticated request and decode the JSON body.
    async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-api-key", &self.key)
            .header("x-api-secret", &self.secret);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn created_leads_are_fetchable_and_listed() {
    let Some(app) = test_app().await else { return };
    let name = format!("Lead-{}", Uuid::new_v4());

    let (status, body) = app
        .request("POST", "/api/v1/leads", Some(json!({ "name": name })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], json!(name));
    assert_eq!(body["data"]["status"], json!("New"));
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // The returned id resolves via get
    let (status, body) = app
        .request("GET", &format!("/api/v1/leads/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], json!(name));

    // ...and the record appears in the list endpoint
    let (status, body) = app
        .request("GET", &format!("/api/v1/leads?search={name}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], json!(id));
    assert_eq!(body["pagination"]["total_items"], json!(1));
    assert_eq!(body["pagination"]["total_pages"], json!(1));
}

#[tokio::test]
async fn deleting_a_make_leaves_its_models_in_place() {
    let Some(app) = test_app().await else { return };
    let make_name = format!("Make-{}", Uuid::new_v4());

    let (status, body) = app
        .request("POST", "/api/v1/makes", Some(json!({ "name": make_name })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let make_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/vehicle-models",
            Some(json!({ "name": "Corolla", "make_id": make_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let model_id = body["data"]["id"].as_str().unwrap().to_string();

    let by_make = format!("/api/v1/vehicle-models/make/{make_id}");
    let (status, body) = app.request("GET", &by_make, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], json!(model_id));

    let (status, _) = app
        .request("DELETE", &format!("/api/v1/makes/{make_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // No cascade: the model survives its parent
    let (status, body) = app.request("GET", &by_make, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], json!(model_id));

    // Deleting the make again is a 404, never a 500
    let (status, _) = app
        .request("DELETE", &format!("/api/v1/makes/{make_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn activity_stats_total_matches_per_type_counts() {
    let Some(app) = test_app().await else { return };

    // A dedicated user scopes the aggregation to this test's rows
    let user_id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id",
    )
    .bind("Stats Tester")
    .bind("stats-tester@example.com")
    .fetch_one(&app.pool)
    .await
    .unwrap();

    for (activity_type, count) in [("call_logged", 3), ("email_sent", 2), ("visit_booked", 1)] {
        for n in 0..count {
            let (status, _) = app
                .request(
                    "POST",
                    "/api/v1/activities",
                    Some(json!({
                        "user_id": user_id,
                        "activity_type": activity_type,
                        "content": format!("entry {n}"),
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }
    }

    let (status, body) = app
        .request("GET", &format!("/api/v1/activities/stats?user_id={user_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let stats = &body["data"];
    let by_type = stats["activities_by_type"].as_array().unwrap();
    assert_eq!(by_type.len(), 3);

    let sum: i64 = by_type.iter().map(|t| t["count"].as_i64().unwrap()).sum();
    assert_eq!(stats["total_activities"].as_i64().unwrap(), sum);
    assert_eq!(sum, 6);

    // Highest count wins
    assert_eq!(stats["most_frequent_type"], json!("call_logged"));
    assert_eq!(by_type[0]["activity_type"], json!("call_logged"));
    assert_eq!(by_type[0]["count"], json!(3));
}
