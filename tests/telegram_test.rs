//! Telegram adapters against a mocked Bot API server

use imglinker::telegram::webhook;
use imglinker::telegram::{Bot, TelegramMembership, TelegramRelay};
use imglinker::upload::{ChannelGate, MembershipCheck, Relay};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::types::UserId;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bot_for(server: &MockServer) -> Bot {
    Bot::new("test_token").set_api_url(server.uri().parse().unwrap())
}

fn chat_member(status: &str) -> serde_json::Value {
    json!({
        "ok": true,
        "result": {
            "status": status,
            "user": { "id": 42, "is_bot": false, "first_name": "Ada" }
        }
    })
}

async fn mount_member_status(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path_regex("(?i)/bottest_token/getchatmember"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_member_status_is_member() {
    let server = MockServer::start().await;
    mount_member_status(&server, chat_member("member")).await;

    let membership = TelegramMembership::new(bot_for(&server));
    assert!(membership.is_member(UserId(42), "@news").await.unwrap());
}

#[tokio::test]
async fn test_left_status_is_not_member() {
    let server = MockServer::start().await;
    mount_member_status(&server, chat_member("left")).await;

    let membership = TelegramMembership::new(bot_for(&server));
    assert!(!membership.is_member(UserId(42), "@news").await.unwrap());
}

#[tokio::test]
async fn test_gate_denies_when_lookup_fails() {
    let server = MockServer::start().await;
    mount_member_status(
        &server,
        json!({ "ok": false, "error_code": 400, "description": "Bad Request: chat not found" }),
    )
    .await;

    let membership = Arc::new(TelegramMembership::new(bot_for(&server)));
    assert!(membership.is_member(UserId(42), "@news").await.is_err());

    let gate = ChannelGate::new(Some("@news".to_string()), membership);
    assert!(!gate.permits(UserId(42)).await);
}

#[tokio::test]
async fn test_download_streams_file_to_destination() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex("(?i)/bottest_token/getfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {
                "file_id": "AgACAgIAAxkBAAIB",
                "file_unique_id": "AQADAgAT",
                "file_size": 14,
                "file_path": "photos/file_1.jpg"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/bottest_token/photos/file_1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake-jpeg-body".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("4242_photo.jpg");
    let relay = TelegramRelay::new(bot_for(&server)).unwrap();

    let location = relay.download("AgACAgIAAxkBAAIB", &destination).await.unwrap();

    assert_eq!(location, destination);
    assert_eq!(std::fs::read(&destination).unwrap(), b"fake-jpeg-body");
    assert!(!dir.path().join("4242_photo.jpg.part").exists());
}

#[tokio::test]
async fn test_download_failure_leaves_no_partial_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex("(?i)/bottest_token/getfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {
                "file_id": "AgACAgIAAxkBAAIB",
                "file_unique_id": "AQADAgAT",
                "file_size": 14,
                "file_path": "photos/file_1.jpg"
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/bottest_token/photos/file_1.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("4242_photo.jpg");
    let relay = TelegramRelay::new(bot_for(&server)).unwrap();

    assert!(relay.download("AgACAgIAAxkBAAIB", &destination).await.is_err());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

fn file_info() -> serde_json::Value {
    json!({
        "ok": true,
        "result": {
            "file_id": "AgACAgIAAxkBAAIB",
            "file_unique_id": "AQADAgAT",
            "file_size": 14,
            "file_path": "photos/file_1.jpg"
        }
    })
}

#[tokio::test]
async fn test_download_cleans_partial_file_when_destination_is_taken() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex("(?i)/bottest_token/getfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_info()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/bottest_token/photos/file_1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake-jpeg-body".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    // The body is fully written to the .part file, then the rename fails
    let destination = dir.path().join("4242_photo.jpg");
    std::fs::create_dir(&destination).unwrap();
    let relay = TelegramRelay::new(bot_for(&server)).unwrap();

    assert!(relay.download("AgACAgIAAxkBAAIB", &destination).await.is_err());
    assert!(!dir.path().join("4242_photo.jpg.part").exists());
    assert!(destination.is_dir());
}

#[tokio::test]
async fn test_webhook_is_registered_once_and_keeps_pending_updates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex("(?i)/bottest_token/setwebhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })))
        .expect(1)
        .mount(&server)
        .await;

    let url = webhook::webhook_url("https://bot.example.com", "test_token").unwrap();
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let _listener = webhook::serve(bot_for(&server), url, addr).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let registrations: Vec<_> = requests
        .iter()
        .filter(|r| r.url.path().to_ascii_lowercase().ends_with("/setwebhook"))
        .collect();
    assert_eq!(registrations.len(), 1);
    let body = String::from_utf8_lossy(&registrations[0].body);
    assert!(body.contains("bot.example.com"), "{body}");
    assert!(!body.contains("drop_pending_updates"), "{body}");
}
