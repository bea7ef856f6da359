//! Owner commands against a temporary database

mod common;

use common::FakeRelay;
use imglinker::storage::db;
use imglinker::telegram::admin::{self, BroadcastReport};
use imglinker::{create_pool, get_connection, DbPool};
use pretty_assertions::assert_eq;
use teloxide::types::ChatId;
use tempfile::TempDir;

const OWNER: i64 = 1000;

fn seeded_pool(dir: &TempDir, users: &[i64]) -> DbPool {
    let path = dir.path().join("bot.db");
    let pool = create_pool(path.to_str().unwrap()).unwrap();
    let conn = get_connection(&pool).unwrap();
    for id in users {
        db::add_user(&conn, *id, Some("someone")).unwrap();
    }
    pool
}

#[tokio::test]
async fn test_users_command_reports_count() {
    let dir = TempDir::new().unwrap();
    let pool = seeded_pool(&dir, &[1, 2, 3]);
    let relay = FakeRelay::new();

    admin::handle_users_command(relay.as_ref(), &pool, ChatId(OWNER)).await.unwrap();

    assert_eq!(relay.sent_texts(), vec!["📊 Total users in database: <b>3</b>".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_broadcast_skips_owner_and_counts_failures() {
    let dir = TempDir::new().unwrap();
    let pool = seeded_pool(&dir, &[OWNER, 1, 2, 3]);
    let relay = FakeRelay::new();
    relay.fail_sends_to(ChatId(2));

    let report = admin::handle_broadcast_command(relay.as_ref(), &pool, ChatId(OWNER), OWNER, "Maintenance <tonight>")
        .await
        .unwrap();

    assert_eq!(report, BroadcastReport { sent: 2, failed: 1 });
    // Status message plus one attempt per non-owner user
    assert_eq!(relay.sends_to(ChatId(OWNER)), 1);
    assert_eq!(relay.sends_to(ChatId(1)), 1);
    assert_eq!(relay.sends_to(ChatId(2)), 1);
    assert_eq!(relay.sends_to(ChatId(3)), 1);
    assert!(relay
        .sent_texts()
        .contains(&"Maintenance &lt;tonight&gt;".to_string()));
    assert_eq!(
        relay.last_edit().unwrap().0,
        "✅ Broadcast complete!\n➡️ Sent to: <b>2</b> users\n❌ Failed to send to: <b>1</b> users"
    );
}

#[tokio::test]
async fn test_broadcast_without_text_shows_usage() {
    let dir = TempDir::new().unwrap();
    let pool = seeded_pool(&dir, &[1]);
    let relay = FakeRelay::new();

    let report = admin::handle_broadcast_command(relay.as_ref(), &pool, ChatId(OWNER), OWNER, "   ")
        .await
        .unwrap();

    assert_eq!(report, BroadcastReport::default());
    assert_eq!(relay.sent_texts(), vec![admin::BROADCAST_USAGE.to_string()]);
    assert_eq!(relay.sends_to(ChatId(1)), 0);
}
