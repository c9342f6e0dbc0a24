//! End-to-end: real filesystem writes → watcher → hub → client connection.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use taskboard_core::{Board, BoardId, Card, CardId, FileStore, List};
use taskboard_live::{ChannelConnection, LiveSync, WatcherConfig};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

const SETTLE: Duration = Duration::from_millis(300);

fn config() -> WatcherConfig {
    WatcherConfig {
        debounce: Duration::from_millis(200),
    }
}

fn seed_board(root: &Path, id: &str) {
    FileStore::new(root)
        .save_board(&Board {
            id: BoardId::from(id),
            name: "Seed".into(),
            lists: vec![List::new("todo", "Todo")],
        })
        .expect("seed board");
}

async fn next_event(rx: &mut mpsc::Receiver<Vec<u8>>) -> Value {
    let payload = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("notification within timeout")
        .expect("connection open");
    serde_json::from_slice(&payload).expect("JSON payload")
}

async fn assert_quiet(rx: &mut mpsc::Receiver<Vec<u8>>) {
    let extra = timeout(Duration::from_millis(800), rx.recv()).await;
    assert!(extra.is_err(), "expected no further notification, got {extra:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn direct_board_edit_notifies_once() {
    let root = TempDir::new().expect("tempdir");
    seed_board(root.path(), "b1");

    let live = LiveSync::start(root.path(), config());
    let (conn, mut rx) = ChannelConnection::new();
    live.hub().register(conn);
    sleep(SETTLE).await;

    // Bypass the store entirely.
    let board_file = root.path().join("boards/b1/board.yaml");
    fs::write(&board_file, "id: b1\nname: Edited\nlists:\n- id: todo\n  name: Todo\n")
        .expect("edit board");

    let event = next_event(&mut rx).await;
    assert_eq!(event["type"], "board_updated");
    assert_eq!(event["board_id"], "b1");
    assert_quiet(&mut rx).await;

    live.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn store_card_write_notifies_card_updated() {
    let root = TempDir::new().expect("tempdir");
    seed_board(root.path(), "b1");
    let store = Arc::new(FileStore::new(root.path()));

    let live = LiveSync::start(root.path(), config());
    let (conn, mut rx) = ChannelConnection::new();
    live.hub().register(conn);
    sleep(SETTLE).await;

    let now = Utc::now();
    let mut card = Card {
        id: CardId::default(),
        title: "x".into(),
        list: "todo".into(),
        order: 0,
        description: String::new(),
        labels: vec![],
        todos: vec![],
        archived: false,
        created_at: now,
        updated_at: now,
    };
    for _ in 0..3 {
        store.create_card(&BoardId::from("b1"), &mut card).expect("create");
    }

    let event = next_event(&mut rx).await;
    assert_eq!(event["type"], "card_updated");
    assert_eq!(event["board_id"], "b1");
    assert_quiet(&mut rx).await;

    live.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn board_created_after_start_is_observed() {
    let root = TempDir::new().expect("tempdir");
    fs::create_dir_all(root.path().join("boards")).expect("mkdir boards");

    let live = LiveSync::start(root.path(), config());
    let (conn, mut rx) = ChannelConnection::new();
    live.hub().register(conn);
    sleep(SETTLE).await;

    seed_board(root.path(), "fresh");

    let event = next_event(&mut rx).await;
    assert_eq!(event["type"], "board_updated");
    assert_eq!(event["board_id"], "fresh");

    live.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unregistered_client_hears_nothing() {
    let root = TempDir::new().expect("tempdir");
    seed_board(root.path(), "b1");

    let live = LiveSync::start(root.path(), config());
    let (gone, mut gone_rx) = ChannelConnection::new();
    let (stays, mut stays_rx) = ChannelConnection::new();
    let gone_id = live.hub().register(gone);
    live.hub().register(stays);
    live.hub().unregister(gone_id);
    sleep(SETTLE).await;

    fs::write(root.path().join("boards/b1/board.yaml"), "id: b1\nname: Again\n")
        .expect("edit board");

    let event = next_event(&mut stays_rx).await;
    assert_eq!(event["board_id"], "b1");
    assert!(gone_rx.try_recv().is_err());

    live.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn foreign_files_do_not_notify() {
    let root = TempDir::new().expect("tempdir");
    seed_board(root.path(), "b1");

    let live = LiveSync::start(root.path(), config());
    let (conn, mut rx) = ChannelConnection::new();
    live.hub().register(conn);
    sleep(SETTLE).await;

    fs::write(root.path().join("boards/b1/cards/notes.md"), "# scratch").expect("write");
    fs::write(root.path().join("README.yaml"), "outside boards").expect("write");

    assert_quiet(&mut rx).await;
    live.shutdown().await.expect("shutdown");
}
