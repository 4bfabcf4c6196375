pub mod board;
mod hub;
/// Session tokens.
pub mod session;

use std::{future::Future, sync::Arc};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};

use crate::{config::AppConfig, dao::board_store::BoardStore, error::ServiceError};

pub use self::hub::BoardHub;
use self::session::SessionRegistry;

/// Reference-counted handle passed to every handler and service.
pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, live hub, sessions and per-board gates.
pub struct AppState {
    board_store: RwLock<Option<Arc<dyn BoardStore>>>,
    hub: BoardHub,
    sessions: SessionRegistry,
    board_gates: DashMap<String, Arc<Mutex<()>>>,
    degraded: watch::Sender<bool>,
    config: Arc<AppConfig>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            board_store: RwLock::new(None),
            hub: BoardHub::new(config.broadcast_capacity()),
            sessions: SessionRegistry::new(config.session_ttl()),
            board_gates: DashMap::new(),
            degraded: degraded_tx,
            config: Arc::new(config),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Obtain a handle to the current board store, if one is installed.
    pub async fn board_store(&self) -> Option<Arc<dyn BoardStore>> {
        let guard = self.board_store.read().await;
        guard.as_ref().cloned()
    }

    /// Board store handle, or [`ServiceError::Degraded`] while none is installed.
    pub async fn require_board_store(&self) -> Result<Arc<dyn BoardStore>, ServiceError> {
        self.board_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new board store implementation and leave degraded mode.
    pub async fn install_board_store(&self, store: Arc<dyn BoardStore>) {
        {
            let mut guard = self.board_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current board store and enter degraded mode.
    pub async fn clear_board_store(&self) {
        {
            let mut guard = self.board_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Live update topic shared by every viewer.
    pub fn hub(&self) -> &BoardHub {
        &self.hub
    }

    /// Issued session tokens.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Run `work` while holding the mutation gate of `username`'s board.
    ///
    /// Provisioning, ensure and toggle all go through the same gate, so two
    /// mutations of one board never interleave and a user's updates are
    /// broadcast in the order they were applied. Gates are keyed by username
    /// and live as long as the state, maintenance resets included.
    pub async fn with_board_gate<F, Fut, T>(&self, username: &str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let gate = self
            .board_gates
            .entry(username.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = gate.lock().await;
        work().await
    }
}
