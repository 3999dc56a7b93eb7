//! Challenge tokens for the query handshake.
//!
//! A token is derived from the client's address and a secret generated once per
//! process, so the server keeps no per-client state: any request can be checked
//! by recomputing the token for its source address. Tokens stay valid until the
//! process restarts.

use crate::config::{SECRET_LEN, TOKEN_DIGEST_OFFSET};
use crate::error::{constants, QueryError, Result};
use sha2::{Digest, Sha512};
use std::fmt;
use std::net::SocketAddr;

use tracing::{debug, instrument};

/// Fill a fresh secret from the operating system's CSPRNG.
///
/// # Errors
/// Returns `QueryError::Entropy` if the random source fails. Callers must treat
/// this as fatal: without a secret the token scheme is meaningless.
pub fn generate_secret() -> Result<[u8; SECRET_LEN]> {
    let mut secret = [0u8; SECRET_LEN];
    getrandom::fill(&mut secret)
        .map_err(|e| QueryError::Entropy(format!("{}: {e}", constants::ERR_ENTROPY)))?;
    Ok(secret)
}

/// Derive the challenge number for `address`.
///
/// `SHA-512(address ":" secret)`, four digest bytes starting at offset 7 read as
/// a big-endian `u32` and reinterpreted as `i32`.
pub fn derive_token(secret: &[u8], address: &str) -> i32 {
    let mut hasher = Sha512::new();
    hasher.update(address.as_bytes());
    hasher.update(b":");
    hasher.update(secret);
    let digest = hasher.finalize();

    let mut word = [0u8; 4];
    word.copy_from_slice(&digest[TOKEN_DIGEST_OFFSET..TOKEN_DIGEST_OFFSET + 4]);
    u32::from_be_bytes(word) as i32
}

/// Holds the process secret and answers token questions for socket addresses.
#[derive(Clone)]
pub struct TokenAuthority {
    secret: [u8; SECRET_LEN],
}

impl TokenAuthority {
    /// Create an authority with a freshly generated secret
    #[instrument]
    pub fn new() -> Result<Self> {
        let secret = generate_secret()?;
        debug!("Generated query token secret");
        Ok(Self { secret })
    }

    /// Create an authority from a known secret, e.g. one shared between nodes
    pub fn from_secret(secret: [u8; SECRET_LEN]) -> Self {
        Self { secret }
    }

    /// Token the client at `addr` must echo in its information request
    pub fn token_for(&self, addr: &SocketAddr) -> i32 {
        derive_token(&self.secret, &addr.to_string())
    }

    /// Check a claimed token against the one derived for `addr`
    pub fn verify(&self, addr: &SocketAddr, claimed: i32) -> Result<()> {
        let expected = self.token_for(addr);
        if claimed != expected {
            return Err(QueryError::TokenMismatch {
                expected,
                received: claimed,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("secret", &"<redacted>")
            .finish()
    }
}
