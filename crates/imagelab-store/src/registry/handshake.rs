//! The handshake registry: `session_id -> HandshakeContext`.

use dashmap::DashMap;
use imagelab_crypto::HandshakeContext;
use imagelab_protocol::SessionLookup;

/// Stores completed handshakes, keyed by session id. Entries are immutable
/// once stored; sharded internally so lookups for distinct sessions never
/// contend.
#[derive(Debug, Default)]
pub struct HandshakeRegistry {
    sessions: DashMap<String, HandshakeContext>,
}

impl HandshakeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Store a newly completed handshake under its session id.
    pub fn store(&self, context: HandshakeContext) {
        self.sessions.insert(context.session_id.clone(), context);
    }

    /// Look up a handshake by session id.
    pub fn get(&self, session_id: &str) -> Option<HandshakeContext> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionLookup for HandshakeRegistry {
    fn get(&self, session_id: &str) -> Option<HandshakeContext> {
        HandshakeRegistry::get(self, session_id)
    }
}
