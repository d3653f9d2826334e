//! Per-invocation context passed into every handler.
//!
//! The context transports identity, the resolved Splunk config, the session
//! pool handle, the cancellation signal, and the dispatcher for re-entrant
//! calls. It is an explicit value handed into handlers, never ambient state.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use splunk_config::{SourceMap, SplunkConfig};

use crate::pool::SessionPool;
use crate::surface::Dispatcher;

/// Which transport delivered the current invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Line-delimited JSON over standard streams; strictly serial.
    Stdio,
    /// Streaming HTTP; responses may interleave.
    Http,
}

impl TransportKind {
    /// Stable lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Http => "http",
        }
    }
}

/// Opaque stable identifier for the current caller.
///
/// Lives for the duration of one transport session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Wrap a transport-assigned session identifier.
    pub fn from_session(id: &str) -> Self {
        Self(format!("session-{id}"))
    }

    /// Derive an identity from the resolved config fingerprint when the
    /// transport assigned no session id.
    pub fn from_fingerprint(fp: splunk_config::Fingerprint) -> Self {
        Self(format!("cfg-{fp}"))
    }

    /// Synthetic identity for stdio sessions with no config at all.
    pub fn synthetic(process_id: &str) -> Self {
        Self(format!("stdio-{process_id}"))
    }

    /// The identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a handler needs for one invocation.
///
/// Handlers borrow the context for the duration of one call; they never
/// retain it (or the session it leads to) across invocations.
#[derive(Clone)]
pub struct InvocationContext {
    /// Who is calling.
    pub identity: ClientIdentity,
    /// The Splunk connection parameters resolved for this invocation.
    pub config: SplunkConfig,
    /// Which source supplied each config field.
    pub source_map: SourceMap,
    /// Cooperative cancellation signal propagated from the transport.
    pub cancel: CancellationToken,
    /// Shared session pool; sessions are borrowed per call.
    pub pool: Arc<SessionPool>,
    /// Dispatcher for re-entrant component calls (workflow engine).
    pub dispatcher: Arc<Dispatcher>,
}

impl InvocationContext {
    /// Derive a child context for a sub-invocation (workflow task).
    ///
    /// The child shares identity, config, and pool; its cancellation token
    /// is a child of this context's token so workflow cancellation
    /// propagates to every in-flight child invocation.
    pub fn child(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            config: self.config.clone(),
            source_map: self.source_map.clone(),
            cancel: self.cancel.child_token(),
            pool: Arc::clone(&self.pool),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}
