//! Bootstrap against a mock API server and a temporary config directory.

use nia_application::{AppBootstrap, LoginScreen};
use nia_core::auth::LoginProgress;
use nia_core::child::ChildId;
use nia_core::config::RootConfig;
use nia_core::conversation::Rating;
use nia_core::feedback::RateOutcome;
use nia_infrastructure::NiaPaths;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, persist: bool) -> RootConfig {
    let mut config = RootConfig::default();
    config.api.base_url = format!("{}/api/v1", server.uri());
    config.session.persist = persist;
    config
}

async fn mount_household(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/children/"))
        .and(header("authorization", "Bearer guardian-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "display_name": "Ava", "grade_level": "2nd" }
        ])))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/children/verify-pin"))
        .and(body_json(json!({ "child_id": 1, "pin": "4321" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "verified": true,
            "child": { "id": 1, "display_name": "Ava", "grade_level": "2nd" }
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn write_token(dir: &TempDir) {
    fs::write(
        dir.path().join("secret.json"),
        r#"{ "guardian_token": "guardian-tok" }"#,
    )
    .unwrap();
}

#[tokio::test]
async fn test_signs_in_over_http_and_survives_restart() {
    let server = MockServer::start().await;
    mount_household(&server).await;
    let dir = TempDir::new().unwrap();
    write_token(&dir);

    let usecase = AppBootstrap::new(config_for(&server, true), NiaPaths::at(dir.path()))
        .build()
        .await
        .unwrap();
    let LoginScreen::Picker(login) = usecase.begin_login().await.unwrap() else {
        panic!("expected the profile picker");
    };
    login.select(ChildId(1)).await.unwrap();
    let mut last = LoginProgress::Ignored;
    for c in "4321".chars() {
        last = login.press_char(c).await.unwrap();
    }
    assert!(matches!(last, LoginProgress::Authenticated(_)));
    assert!(dir.path().join("session.toml").exists());

    let restarted = AppBootstrap::new(config_for(&server, true), NiaPaths::at(dir.path()))
        .build()
        .await
        .unwrap();
    assert_eq!(restarted.current_child().unwrap().display_name, "Ava");

    restarted.logout().await;
    assert!(!dir.path().join("session.toml").exists());
}

#[tokio::test]
async fn test_isolated_session_is_not_written() {
    let server = MockServer::start().await;
    mount_household(&server).await;
    let dir = TempDir::new().unwrap();
    write_token(&dir);

    let usecase = AppBootstrap::new(config_for(&server, false), NiaPaths::at(dir.path()))
        .build()
        .await
        .unwrap();
    let LoginScreen::Picker(login) = usecase.begin_login().await.unwrap() else {
        panic!("expected the profile picker");
    };
    login.select(ChildId(1)).await.unwrap();
    for c in "4321".chars() {
        login.press_char(c).await.unwrap();
    }

    assert!(usecase.current_child().is_some());
    assert!(!dir.path().join("session.toml").exists());
}

#[tokio::test]
async fn test_chat_turn_and_feedback_over_http() {
    let server = MockServer::start().await;
    mount_household(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/conversation/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message_id": "7",
            "conversation_id": 12,
            "text": "Seahorses are fish!",
            "tutoring_depth_level": 1,
            "source_label": "ℹ️ From what I know",
            "source_citations": [],
            "related_topics": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/conversation/feedback"))
        .and(body_json(json!({ "message_id": 7, "rating": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    write_token(&dir);

    let usecase = AppBootstrap::new(config_for(&server, false), NiaPaths::at(dir.path()))
        .build()
        .await
        .unwrap();
    let LoginScreen::Picker(login) = usecase.begin_login().await.unwrap() else {
        panic!("expected the profile picker");
    };
    login.select(ChildId(1)).await.unwrap();
    for c in "4321".chars() {
        login.press_char(c).await.unwrap();
    }

    let chat = usecase.open_chat().unwrap();
    let outcome = chat.send("What is a seahorse?").await.unwrap();
    assert!(!outcome.fallback);

    let first = chat.rate(outcome.reply.id, Rating::Helpful).await.unwrap();
    let second = chat.rate(outcome.reply.id, Rating::NotHelpful).await.unwrap();
    assert_eq!(first, RateOutcome::Recorded(Rating::Helpful));
    assert_eq!(second, RateOutcome::AlreadyRecorded(Rating::Helpful));
}
