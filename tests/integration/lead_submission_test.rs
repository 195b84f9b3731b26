//! End-to-end lead submission through the pipeline components
//!
//! A wiremock server stands in for the webhook endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use lead_gateway::config::Config;
use lead_gateway::models::{ClientContext, FallbackPolicy, WebhookConfig};
use lead_gateway::services::{
    AnalyticsSink, DispatchSettings, FormController, FormState, FormStatus, LeadDataStore,
    SubmissionDispatcher, SubmissionEnricher, WebhookRegistry,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn lead_config(url: String) -> WebhookConfig {
    WebhookConfig::new("community", url).with_required(&["name", "email", "phone"])
}

fn controller(config: WebhookConfig, store: Arc<LeadDataStore>) -> FormController {
    let sink: Arc<dyn AnalyticsSink> = store;
    let settings = DispatchSettings {
        initial_backoff: Duration::from_millis(1),
        ..DispatchSettings::default()
    };

    FormController::new(
        Arc::new(config),
        SubmissionEnricher::default(),
        SubmissionDispatcher::new(Duration::from_secs(2), settings, sink),
        ClientContext {
            page_url: "https://site.com.br/?utm_source=newsletter".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            language: "pt-BR".to_string(),
            referrer: String::new(),
        },
        Duration::from_millis(3000),
    )
}

fn fill(controller: &mut FormController, email: &str) {
    controller.set_field("name", "Ana Silva");
    controller.set_field("email", email);
    controller.set_field("phone", "11987654321");
}

#[tokio::test]
async fn test_confirmed_submission_sets_cookies_and_resets_form() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/community"))
        .and(body_partial_json(serde_json::json!({
            "name": "Ana Silva",
            "email": "ana@test.com",
            "utm_source": "newsletter",
            "referrer": "direct",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(LeadDataStore::new());
    let mut controller = controller(
        lead_config(format!("{}/webhook/community", server.uri())),
        store.clone(),
    );
    fill(&mut controller, "ana@test.com");

    let outcome = controller.submit().await?;

    assert_eq!(outcome.status, FormStatus::Success);
    assert!(matches!(controller.state(), FormState::Success { .. }));
    assert_eq!(store.cookie("user-email").as_deref(), Some("ana@test.com"));
    assert_eq!(store.cookie("user-phone").as_deref(), Some("(11) 98765-4321"));
    assert_eq!(controller.form().name, "");
    assert_eq!(controller.form().email, "");
    assert_eq!(controller.form().phone, "");

    Ok(())
}

#[tokio::test]
async fn test_network_failure_under_continue_still_succeeds() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(LeadDataStore::new());
    let mut controller = controller(
        lead_config(server.uri()).with_fallback(FallbackPolicy::Continue),
        store.clone(),
    );
    fill(&mut controller, "ana@test.com");

    let outcome = controller.submit().await?;

    assert_eq!(outcome.status, FormStatus::Success);
    assert!(outcome.result.as_ref().is_some_and(|r| r.success && r.error.is_some()));
    // mirroring only follows a confirmed delivery
    assert!(store.latest().is_none());
    assert!(store.cookies().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_missing_email_never_reaches_network() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut controller = controller(lead_config(server.uri()), Arc::new(LeadDataStore::new()));
    fill(&mut controller, "");

    assert!(controller.submit().await.is_err());
    assert_eq!(controller.state(), &FormState::Idle);
    assert_eq!(controller.field_errors().message_for("email"), Some("Email is required"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());

    Ok(())
}

#[test]
fn test_bootcamp_path_resolves_to_its_own_webhook() -> Result<()> {
    let config = Config::from_vars(&HashMap::new())?;
    let registry = WebhookRegistry::new(config.webhooks);

    let webhook = registry.lookup_by_path("/bootcamp/ai-data-engineer");
    assert_eq!(webhook.key, "bootcamps.ai-data-engineer");
    assert_ne!(webhook.key, registry.fallback().key);

    Ok(())
}

#[tokio::test]
async fn test_disabled_webhooks_skip_but_succeed() -> Result<()> {
    let vars: HashMap<String, String> =
        [("VITE_N8N_ENABLED".to_string(), "false".to_string())].into_iter().collect();
    let config = Config::from_vars(&vars)?;
    let registry = WebhookRegistry::new(config.webhooks);
    let community = registry.lookup("community");
    assert!(!community.enabled);

    let store = Arc::new(LeadDataStore::new());
    let mut controller = controller((*community).clone(), store.clone());
    fill(&mut controller, "ana@test.com");

    let outcome = controller.submit().await?;
    assert_eq!(outcome.status, FormStatus::Success);
    assert!(outcome.result.is_some_and(|r| r.skipped));
    assert!(store.latest().is_none());

    Ok(())
}

#[tokio::test]
async fn test_block_policy_surfaces_failure() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut controller = controller(
        lead_config(server.uri()).with_fallback(FallbackPolicy::Block),
        Arc::new(LeadDataStore::new()),
    );
    fill(&mut controller, "ana@test.com");

    let outcome = controller.submit().await?;
    assert_eq!(outcome.status, FormStatus::Error);
    assert!(outcome.result.is_some_and(|r| !r.success));

    Ok(())
}

#[tokio::test]
async fn test_retry_policy_recovers_from_transient_failure() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let store = Arc::new(LeadDataStore::new());
    let mut controller = controller(
        lead_config(server.uri()).with_fallback(FallbackPolicy::Retry),
        store.clone(),
    );
    fill(&mut controller, "ana@test.com");

    let outcome = controller.submit().await?;
    assert!(outcome.result.is_some_and(|r| r.is_delivered()));
    assert_eq!(store.latest().map(|l| l.email).as_deref(), Some("ana@test.com"));

    Ok(())
}
