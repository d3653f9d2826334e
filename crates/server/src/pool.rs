//! Fingerprint-keyed Splunk session pool.
//!
//! Sessions are opened lazily on first acquire and cached by config
//! fingerprint. Opening is guarded by a per-fingerprint single-flight gate:
//! when N concurrent acquires race for the same fingerprint, exactly one
//! authentication handshake is performed and the others await its result.
//! A background reaper closes sessions idle past a configurable TTL.
//!
//! # Invariants
//! - A session is only reused for an identical config fingerprint; any
//!   field change mints a new session.
//! - No session is ever handed to a handler operating under a different
//!   fingerprint.
//! - The pool never retries failed handshakes; retry policy lies with the
//!   caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use splunk_client::{ClientError, SplunkClient};
use splunk_config::constants::{DEFAULT_POOL_IDLE_TTL_SECS, DEFAULT_POOL_REAP_INTERVAL_SECS};
use splunk_config::{Fingerprint, SplunkConfig};

/// Failures opening a pooled session.
#[derive(Error, Debug, Clone)]
pub enum PoolError {
    /// Splunk rejected the credentials.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The Splunk host could not be reached.
    #[error("Splunk unreachable: {0}")]
    Unreachable(String),

    /// Certificate verification failed with verify_tls enabled.
    #[error("TLS failure: {0}")]
    TlsFailed(String),
}

impl From<ClientError> for PoolError {
    fn from(e: ClientError) -> Self {
        match &e {
            ClientError::TlsError(msg) => PoolError::TlsFailed(msg.clone()),
            _ if e.is_auth_error() => PoolError::AuthFailed(e.to_string()),
            _ => PoolError::Unreachable(e.to_string()),
        }
    }
}

/// An authenticated Splunk client bound to one config fingerprint.
///
/// The underlying client serialises its own token refresh but its methods
/// take `&mut self`, so the pool wraps it in a per-session mutex and treats
/// the fingerprint's entry as a single logical resource.
pub struct Session {
    client: Mutex<SplunkClient>,
    fingerprint: Fingerprint,
    last_used: std::sync::Mutex<Instant>,
    healthy: AtomicBool,
}

impl Session {
    fn new(client: SplunkClient, fingerprint: Fingerprint) -> Self {
        Self {
            client: Mutex::new(client),
            fingerprint,
            last_used: std::sync::Mutex::new(Instant::now()),
            healthy: AtomicBool::new(true),
        }
    }

    /// Borrow the client for the duration of one invocation.
    pub async fn client(&self) -> MutexGuard<'_, SplunkClient> {
        self.touch();
        self.client.lock().await
    }

    /// The fingerprint this session is bound to.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Mark the session as used now; called on acquire and release.
    pub fn touch(&self) {
        if let Ok(mut last) = self.last_used.lock() {
            *last = Instant::now();
        }
    }

    /// Mark the session unhealthy so the reaper drops it on the next sweep.
    pub fn mark_unhealthy(&self) {
        self.healthy.store(false, Ordering::Relaxed);
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    fn idle_for(&self) -> Duration {
        self.last_used
            .lock()
            .map(|last| last.elapsed())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("fingerprint", &self.fingerprint)
            .field("healthy", &self.is_healthy())
            .finish_non_exhaustive()
    }
}

/// Concurrent session cache keyed by config fingerprint.
#[derive(Debug)]
pub struct SessionPool {
    sessions: DashMap<Fingerprint, Arc<Session>>,
    gates: DashMap<Fingerprint, Arc<Mutex<()>>>,
    idle_ttl: Duration,
}

impl SessionPool {
    /// Create a pool with the default idle TTL (10 minutes).
    pub fn new() -> Self {
        Self::with_idle_ttl(Duration::from_secs(DEFAULT_POOL_IDLE_TTL_SECS))
    }

    /// Create a pool with a custom idle TTL.
    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            gates: DashMap::new(),
            idle_ttl,
        }
    }

    /// Return a cached session for this config's fingerprint, opening a new
    /// one with a single authentication handshake on miss.
    ///
    /// # Errors
    ///
    /// [`PoolError::AuthFailed`] when credentials are rejected,
    /// [`PoolError::Unreachable`] for network failures, and
    /// [`PoolError::TlsFailed`] for certificate failures. None are retried
    /// here.
    pub async fn acquire(&self, config: &SplunkConfig) -> Result<Arc<Session>, PoolError> {
        let fingerprint = config.fingerprint();

        // Fast path: lock-free read of an existing session.
        if let Some(session) = self.sessions.get(&fingerprint) {
            session.touch();
            return Ok(Arc::clone(&session));
        }

        // Slow path: single-flight handshake per fingerprint. Racers block
        // on the gate and find the winner's session on re-check.
        let gate = self
            .gates
            .entry(fingerprint)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = gate.lock().await;

        if let Some(session) = self.sessions.get(&fingerprint) {
            session.touch();
            return Ok(Arc::clone(&session));
        }

        debug!(%fingerprint, "opening new Splunk session");
        let mut client = SplunkClient::builder()
            .from_config(config)?
            .build()?;
        client.handshake().await?;

        let session = Arc::new(Session::new(client, fingerprint));
        self.sessions.insert(fingerprint, Arc::clone(&session));
        info!(%fingerprint, live = self.sessions.len(), "Splunk session opened");
        Ok(session)
    }

    /// Mark a session as recently used. Sessions are not closed eagerly.
    pub fn release(&self, session: &Session) {
        session.touch();
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the pool holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle past the TTL or marked unhealthy.
    ///
    /// Returns the number of sessions removed.
    pub fn reap(&self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.is_healthy() && session.idle_for() < self.idle_ttl);
        // Gates for evicted fingerprints are recreated on demand.
        self.gates
            .retain(|fingerprint, _| self.sessions.contains_key(fingerprint));
        let removed = before - self.sessions.len();
        if removed > 0 {
            info!(removed, live = self.sessions.len(), "reaped idle Splunk sessions");
        }
        removed
    }

    /// Spawn the background reaper task.
    ///
    /// The task runs until the pool is dropped by all owners; the returned
    /// handle can be aborted for a prompt shutdown.
    pub fn spawn_reaper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let pool = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(DEFAULT_POOL_REAP_INTERVAL_SECS));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                match pool.upgrade() {
                    Some(pool) => {
                        pool.reap();
                    }
                    None => {
                        warn!("session pool dropped, stopping reaper");
                        break;
                    }
                }
            }
        })
    }

    /// Drop every session, e.g. on shutdown.
    pub fn clear(&self) {
        self.sessions.clear();
        self.gates.clear();
    }
}

impl Default for SessionPool {
    fn default() -> Self {
        Self::new()
    }
}
