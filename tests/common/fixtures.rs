//! A wired-up upload flow over a temporary downloads directory

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use teloxide::types::{ChatId, MessageId, UserId};

use imglinker::hosts::HostRegistry;
use imglinker::storage::AssetStore;
use imglinker::upload::{ChannelGate, MembershipCheck, PhotoReceived, SelectionMade, UploadFlow};

use super::fakes::{FakeRelay, StaticMembership, StubHost};

pub const CHAT: ChatId = ChatId(4242);
pub const USER: UserId = UserId(4242);

pub struct TestEnvironment {
    pub dir: TempDir,
    pub relay: Arc<FakeRelay>,
    pub assets: Arc<AssetStore>,
    pub flow: Arc<UploadFlow>,
}

impl TestEnvironment {
    /// No gate, hosts registered in the given order
    pub fn new(hosts: Vec<Arc<StubHost>>) -> Self {
        Self::build(FakeRelay::new(), hosts, None, StaticMembership::member())
    }

    pub fn gated(hosts: Vec<Arc<StubHost>>, membership: Arc<StaticMembership>) -> Self {
        Self::build(FakeRelay::new(), hosts, Some("@imglinker_news"), membership)
    }

    pub fn build(
        relay: Arc<FakeRelay>,
        hosts: Vec<Arc<StubHost>>,
        channel: Option<&str>,
        membership: Arc<dyn MembershipCheck>,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let mut registry = HostRegistry::new();
        for host in hosts {
            registry.register(host);
        }
        let assets = Arc::new(AssetStore::new());
        let gate = ChannelGate::new(channel.map(str::to_string), membership);
        let flow = Arc::new(UploadFlow::new(
            relay.clone(),
            Arc::clone(&assets),
            Arc::new(registry),
            gate,
            dir.path().join("downloads"),
        ));
        Self {
            dir,
            relay,
            assets,
            flow,
        }
    }

    /// Writes a fake photo and registers it under `id`
    pub async fn register_asset(&self, id: &str) -> PathBuf {
        let path = self.dir.path().join(format!("{id}.jpg"));
        std::fs::write(&path, b"\xFF\xD8\xFFfake-jpeg").unwrap();
        assert!(self.assets.register_with_id(id, path.clone()).await);
        path
    }

    /// Files left behind in the downloads directory
    pub fn downloaded_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.dir.path().join("downloads")) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub fn photo(file_id: &str) -> PhotoReceived {
    PhotoReceived {
        chat: CHAT,
        user: USER,
        file_id: file_id.to_string(),
    }
}

pub fn selection(query_id: &str, data: &str) -> SelectionMade {
    SelectionMade {
        chat: CHAT,
        user: USER,
        message: MessageId(7),
        query_id: query_id.to_string(),
        data: data.to_string(),
    }
}
