use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use crate::integration::common::{TestApp, setup_app_without_db, setup_test_app};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Submit a background search and wait for it to finish.
async fn saved_search(app: &TestApp) -> Uuid {
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/v1/searches",
            serde_json::json!({"query": "rust", "max_pages": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response).await;
    app.drain_tasks().await;
    json["search_id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "ok");
}

#[tokio::test]
async fn health_reports_unreachable_database() {
    let app = setup_app_without_db().await;

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["database"], "error");
}

#[tokio::test]
async fn search_returns_listings() {
    let app = setup_app_without_db().await;

    let response = app
        .router
        .oneshot(post_json(
            "/v1/search",
            serde_json::json!({"query": "developer", "city": "Москва", "max_pages": 1}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["listings"][0]["salary"], "200000 - 300000 RUR");
    assert_eq!(json["listings"][0]["description"], "Rust, tokio Services");
    assert_eq!(json["listings"][1]["company"], "Not specified");
}

#[tokio::test]
async fn empty_query_returns_400() {
    let app = setup_app_without_db().await;

    for uri in ["/v1/search", "/v1/searches"] {
        let response = app
            .router
            .clone()
            .oneshot(post_json(uri, serde_json::json!({"query": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await["error"], "invalid_input");
    }
}

#[tokio::test]
async fn unknown_mode_returns_400() {
    let app = setup_app_without_db().await;

    let response = app
        .router
        .oneshot(post_json(
            "/v1/search",
            serde_json::json!({"query": "rust", "mode": "carrier-pigeon"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn background_search_is_stored() {
    let app = setup_test_app().await;
    let search_id = saved_search(&app).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get(format!("/v1/searches/{search_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["search"]["query"], "rust");
    assert_eq!(json["search"]["city"], "Москва");
    assert_eq!(json["search"]["results_count"], 2);
    assert_eq!(json["stats"]["total"], 2);
    assert_eq!(json["stats"]["with_salary"], 1);
    assert_eq!(json["stats"]["cities"], 2);
    assert_eq!(json["listings"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_search_returns_404() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::get(format!("/v1/searches/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "not_found");
}

#[tokio::test]
async fn export_downloads_csv() {
    let app = setup_test_app().await;
    let search_id = saved_search(&app).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get(format!("/v1/searches/{search_id}/export?format=csv"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename*=UTF-8''vacancies_rust_"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.starts_with(b"\xEF\xBB\xBF"));
    let rows = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(&body[3..])
        .records()
        .count();
    assert_eq!(rows, 3);
}

#[tokio::test]
async fn export_downloads_xlsx() {
    let app = setup_test_app().await;
    let search_id = saved_search(&app).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get(format!("/v1/searches/{search_id}/export?format=xlsx"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.ends_with(".xlsx"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.starts_with(b"PK"));
}

#[tokio::test]
async fn export_without_listings_returns_404() {
    let app = setup_test_app().await;
    let search = app
        .state
        .db
        .search_repo()
        .create("nothing", "Москва")
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(
            Request::get(format!("/v1/searches/{}/export", search.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_with_unknown_format_returns_400() {
    let app = setup_app_without_db().await;

    let response = app
        .router
        .oneshot(
            Request::get(format!("/v1/searches/{}/export?format=pdf", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
