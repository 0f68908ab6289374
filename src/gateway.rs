//! Messaging gateway over the grammers client
//!
//! The orchestrator and scheduler talk to Telegram through the [`Gateway`]
//! and [`GatewaySession`] traits; tests substitute scripted fakes. The real
//! implementation opens one sender pool per session, resolves peers by
//! walking the dialog list once and caching them, and releases the pool on
//! `close`. Closing consumes the session, so a double release cannot compile.

use std::collections::HashMap;

use async_trait::async_trait;
use grammers_client::peer::Peer;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::TelegramClient;

/// One group or channel the account can broadcast to.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub id: i64,
    pub title: String,
}

#[async_trait]
pub trait GatewaySession: Send + Sync {
    /// Send `text` to a single chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Enumerate the account's groups and channels.
    async fn group_chats(&self) -> Result<Vec<ChatSummary>>;

    /// Release the session. Consuming `self` guarantees at most one release.
    async fn close(self: Box<Self>);
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Acquire an authenticated session for `account_id`. On failure any
    /// partially acquired resources are released before returning.
    async fn open(&self, account_id: &str) -> Result<Box<dyn GatewaySession>>;
}

/// Production gateway backed by grammers.
pub struct TelegramGateway {
    config: Config,
}

impl TelegramGateway {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn open(&self, account_id: &str) -> Result<Box<dyn GatewaySession>> {
        let client = TelegramClient::connect(&self.config, account_id).await?;

        // Authorization check is part of acquisition; release on any failure
        // so a failed open never leaks the sender pool.
        match client.is_authorized().await {
            Ok(true) => {}
            Ok(false) => {
                client.shutdown();
                return Err(Error::AuthorizationRequired);
            }
            Err(e) => {
                client.shutdown();
                return Err(Error::ConnectionError(e.to_string()));
            }
        }

        info!("({}) gateway session opened", account_id);
        Ok(Box::new(TelegramSession {
            client,
            peers: Mutex::new(HashMap::new()),
        }))
    }
}

struct TelegramSession {
    client: TelegramClient,
    /// Chat id -> resolved peer, filled on the first dialog walk.
    peers: Mutex<HashMap<i64, Peer>>,
}

impl TelegramSession {
    async fn resolve_peer(&self, chat_id: i64) -> Result<Peer> {
        {
            let peers = self.peers.lock().await;
            if let Some(peer) = peers.get(&chat_id) {
                return Ok(peer.clone());
            }
        }

        // Not cached yet: walk the dialog list once and remember every peer.
        let mut peers = self.peers.lock().await;
        let mut dialogs = self.client.iter_dialogs();
        while let Some(dialog) = dialogs
            .next()
            .await
            .map_err(|e| Error::TelegramError(e.to_string()))?
        {
            let peer = dialog.peer.clone();
            peers.insert(peer_id(&peer), peer);
        }

        peers
            .get(&chat_id)
            .cloned()
            .ok_or(Error::ChatNotFound(chat_id))
    }
}

#[async_trait]
impl GatewaySession for TelegramSession {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let peer = self.resolve_peer(chat_id).await?;
        self.client
            .send_message(peer_ref(&peer), text)
            .await
            .map_err(|e| Error::TelegramError(e.to_string()))?;
        Ok(())
    }

    async fn group_chats(&self) -> Result<Vec<ChatSummary>> {
        let mut chats = Vec::new();
        let mut peers = self.peers.lock().await;
        let mut dialogs = self.client.iter_dialogs();
        while let Some(dialog) = dialogs
            .next()
            .await
            .map_err(|e| Error::TelegramError(e.to_string()))?
        {
            let peer = dialog.peer.clone();
            if !matches!(peer, Peer::Group(_) | Peer::Channel(_)) {
                continue;
            }
            let id = peer_id(&peer);
            chats.push(ChatSummary {
                id,
                title: chat_title(&peer),
            });
            peers.insert(id, peer);
        }
        Ok(chats)
    }

    async fn close(self: Box<Self>) {
        self.client.shutdown();
    }
}

/// Reference form of a cached peer, as `send_message` expects.
fn peer_ref(peer: &Peer) -> grammers_client::session::PeerRef {
    use grammers_client::session::PeerRef;
    match peer {
        Peer::User(u) => PeerRef::from(&u.raw),
        Peer::Group(g) => PeerRef::from(&g.raw),
        Peer::Channel(c) => PeerRef::from(&c.raw),
    }
}

/// Get ID from Peer
fn peer_id(peer: &Peer) -> i64 {
    match peer {
        Peer::User(u) => u.raw.id(),
        Peer::Group(g) => match &g.raw {
            grammers_tl_types::enums::Chat::Empty(c) => c.id,
            grammers_tl_types::enums::Chat::Chat(c) => c.id,
            grammers_tl_types::enums::Chat::Forbidden(f) => f.id,
            grammers_tl_types::enums::Chat::Channel(c) => c.id,
            grammers_tl_types::enums::Chat::ChannelForbidden(c) => c.id,
        },
        Peer::Channel(c) => c.raw.id,
    }
}

/// Get the display name for a peer
fn chat_title(peer: &Peer) -> String {
    peer.name()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
pub mod testing {
    //! Scripted gateway fakes shared by orchestrator and scheduler tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Gateway whose sessions succeed or fail per chat id according to a
    /// script, recording every attempt and every close.
    pub struct FakeGateway {
        /// Chat ids whose sends fail.
        pub failing_chats: Vec<i64>,
        /// When true, `open` itself fails.
        pub fail_open: bool,
        pub opens: AtomicUsize,
        pub closes: Arc<AtomicUsize>,
        pub attempts: Arc<Mutex<Vec<i64>>>,
        pub chats: Vec<ChatSummary>,
    }

    impl FakeGateway {
        pub fn new() -> Self {
            Self {
                failing_chats: Vec::new(),
                fail_open: false,
                opens: AtomicUsize::new(0),
                closes: Arc::new(AtomicUsize::new(0)),
                attempts: Arc::new(Mutex::new(Vec::new())),
                chats: Vec::new(),
            }
        }

        pub fn failing(chats: Vec<i64>) -> Self {
            Self {
                failing_chats: chats,
                ..Self::new()
            }
        }

        pub fn close_count(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }

        pub fn attempted(&self) -> Vec<i64> {
            self.attempts.lock().unwrap().clone()
        }
    }

    impl Default for FakeGateway {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Gateway for FakeGateway {
        async fn open(&self, _account_id: &str) -> Result<Box<dyn GatewaySession>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if self.fail_open {
                return Err(Error::ConnectionError("scripted open failure".into()));
            }
            Ok(Box::new(FakeSession {
                failing_chats: self.failing_chats.clone(),
                closes: Arc::clone(&self.closes),
                attempts: Arc::clone(&self.attempts),
                chats: self.chats.clone(),
            }))
        }
    }

    struct FakeSession {
        failing_chats: Vec<i64>,
        closes: Arc<AtomicUsize>,
        attempts: Arc<Mutex<Vec<i64>>>,
        chats: Vec<ChatSummary>,
    }

    #[async_trait]
    impl GatewaySession for FakeSession {
        async fn send_message(&self, chat_id: i64, _text: &str) -> Result<()> {
            self.attempts.lock().unwrap().push(chat_id);
            if self.failing_chats.contains(&chat_id) {
                return Err(Error::TelegramError(format!("scripted failure for {}", chat_id)));
            }
            Ok(())
        }

        async fn group_chats(&self) -> Result<Vec<ChatSummary>> {
            Ok(self.chats.clone())
        }

        async fn close(self: Box<Self>) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}
