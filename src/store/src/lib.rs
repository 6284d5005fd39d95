//! Durable, tamper-evident storage for achievement state.
//!
//! The collection is persisted as a single opaque string value under a
//! well-known key: the base64 ciphertext of the plaintext JSON collection,
//! followed by a 64-character hex SHA-256 digest of the plaintext. The
//! digest covers the plaintext (not the ciphertext), so any mutation of the
//! stored value is detected on load.
//!
//! The same slot doubles as an operator channel: writing the literal value
//! `reset`, `reset:all` or `reset:<id>[,<id>...]` in place of normal data is
//! interpreted as an emergency reset command on the next save.

pub mod codec;
pub mod kv;

pub use codec::{DIGEST_LEN, PersistenceCodec};
pub use kv::{FileStore, KvStore, MemoryStore};

/// Well-known key the achievement collection is stored under.
pub const STATE_KEY: &str = "achievements";

/// Reserved keyword that turns the stored slot into an operator command.
const RESET_KEYWORD: &str = "reset";

/// Operator command found in the stored slot in place of encrypted data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetCommand {
    /// `reset` or `reset:all`: clear the entire stored entry.
    Clear,
    /// `reset:<id>[,<id>...]`: reset each named achievement individually.
    Ids(Vec<String>),
}

impl ResetCommand {
    /// Parses the raw stored value as an operator command.
    ///
    /// Returns `None` when the value is ordinary (encrypted-looking) data.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == RESET_KEYWORD {
            return Some(ResetCommand::Clear);
        }

        let rest = raw.strip_prefix(RESET_KEYWORD)?.strip_prefix(':')?;
        if rest == "all" {
            return Some(ResetCommand::Clear);
        }

        let ids: Vec<String> = rest
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        if ids.is_empty() { None } else { Some(ResetCommand::Ids(ids)) }
    }
}
