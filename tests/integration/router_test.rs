//! HTTP surface tests driving the router with `oneshot`

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use lead_gateway::{build_router, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(webhook_url: &str, extra: &[(&str, &str)]) -> Result<Router> {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("VITE_N8N_WEBHOOK_URL".to_string(), webhook_url.to_string());
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }

    let config = Config::from_vars(&vars)?;
    Ok(build_router(AppState::new(config, None)))
}

fn post_json(uri: &str, body: Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "Mozilla/5.0")
        .header(header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9")
        .body(Body::from(body.to_string()))?)
}

fn get(uri: &str) -> Result<Request<Body>> {
    Ok(Request::builder().uri(uri).body(Body::empty())?)
}

async fn json_body(response: axum::response::Response) -> Result<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

fn lead() -> Value {
    json!({
        "name": "Ana Silva",
        "email": "ana@test.com",
        "phone": "11987654321",
        "page_url": "https://site.com.br/comunidade?utm_source=instagram"
    })
}

#[tokio::test]
async fn test_health_reports_configuration() -> Result<()> {
    let response = app("http://127.0.0.1:9/hook", &[])?.oneshot(get("/health")?).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = json_body(response).await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["webhooks_enabled"], true);
    assert_eq!(body["environment"], "development");

    Ok(())
}

#[tokio::test]
async fn test_submit_by_key_delivers_and_sets_cookies() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server.uri(), &[])?
        .oneshot(post_json("/api/v1/leads/community", lead())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(|s| s.to_string()))
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("user-email=ana%40test.com;")));
    assert!(cookies.iter().any(|c| c.starts_with("user-phone=")));
    assert!(cookies.iter().all(|c| c.contains("SameSite=Lax")));

    let body = json_body(response).await?;
    assert_eq!(body["data"]["webhook_key"], "community");
    assert_eq!(body["data"]["state"], "success");
    assert_eq!(body["data"]["result"]["success"], true);
    assert_eq!(body["data"]["result"]["data"]["utm_source"], "instagram");
    assert_eq!(body["data"]["result"]["data"]["language"], "pt-BR");

    Ok(())
}

#[tokio::test]
async fn test_invalid_lead_is_rejected_without_network() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = app(&server.uri(), &[])?
        .oneshot(post_json(
            "/api/v1/leads/community",
            json!({"name": "Ana", "email": "not-an-email"}),
        )?)
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await?;
    assert_eq!(body["error"]["code"], "VAL_3006");
    assert_eq!(body["error"]["fields"][0]["field"], "email");

    Ok(())
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() -> Result<()> {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/leads/community")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;

    let response = app("http://127.0.0.1:9/hook", &[])?.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_block_policy_maps_to_bad_gateway() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let response = app(&server.uri(), &[("VITE_WEBHOOK_FALLBACK", "block")])?
        .oneshot(post_json("/api/v1/leads/community", lead())?)
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    Ok(())
}

#[tokio::test]
async fn test_exhausted_retries_with_backoff_still_succeed() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    // 5 one-second timeouts plus 7.5s of backoff outlast attempts + margin
    let app = app(
        &server.uri(),
        &[
            ("VITE_WEBHOOK_FALLBACK", "retry"),
            ("VITE_WEBHOOK_MAX_RETRIES", "5"),
            ("REQUEST_TIMEOUT", "1"),
        ],
    )?;
    let response = app
        .oneshot(post_json("/api/v1/leads/community", lead())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let body = json_body(response).await?;
    assert_eq!(body["data"]["state"], "success");
    assert_eq!(body["data"]["result"]["success"], true);
    assert!(body["data"]["result"]["error"].is_string());
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(5));

    Ok(())
}

#[tokio::test]
async fn test_submit_by_page_url_redirects_to_checkout() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let body = json!({
        "name": "Ana Silva",
        "email": "ana@test.com",
        "phone": "11987654321",
        "page_url": "https://site.com.br/bootcamp/ai-data-engineer?utm_source=youtube"
    });
    let response = app(&server.uri(), &[])?
        .oneshot(post_json("/api/v1/leads", body)?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    let redirect = body["data"]["redirect_url"].as_str().unwrap_or_default();
    assert_eq!(body["data"]["webhook_key"], "bootcamps.ai-data-engineer");
    assert!(redirect.starts_with("https://pay.example.com/checkout/ai-data-engineer?"));
    assert!(redirect.contains("utm_source=youtube"));
    assert!(redirect.contains("ddi=55"));
    assert!(redirect.contains("celular=987654321"));

    Ok(())
}

#[tokio::test]
async fn test_resolve_endpoint() -> Result<()> {
    let app = app("http://127.0.0.1:9/hook", &[])?;

    let response = app
        .clone()
        .oneshot(get("/api/v1/webhooks/resolve?path=/webinar/agentes-de-ia")?)
        .await?;
    let body = json_body(response).await?;
    assert_eq!(body["data"]["key"], "webinars.agentes-de-ia");
    assert_eq!(body["data"]["fallback"], false);

    let response = app
        .oneshot(get("/api/v1/webhooks/resolve?path=/pricing")?)
        .await?;
    let body = json_body(response).await?;
    assert_eq!(body["data"]["key"], "newsletter");
    assert_eq!(body["data"]["fallback"], true);

    Ok(())
}

#[tokio::test]
async fn test_phone_format_endpoint() -> Result<()> {
    let response = app("http://127.0.0.1:9/hook", &[])?
        .oneshot(get("/api/v1/phone/format?raw=119876")?)
        .await?;
    let body = json_body(response).await?;

    assert_eq!(body["data"]["formatted"], "(11) 9876");
    assert_eq!(body["data"]["digits"], "119876");

    Ok(())
}

#[tokio::test]
async fn test_metrics_without_recorder_is_server_error() -> Result<()> {
    let response = app("http://127.0.0.1:9/hook", &[])?
        .oneshot(get("/metrics")?)
        .await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    Ok(())
}
