//! PKCE (RFC 7636) verifier/challenge generation plus the random `state`
//! and `nonce` values for the authorization-code flow.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// A code verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let code_verifier = random_urlsafe(64);
        let code_challenge = code_challenge_s256(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
        }
    }
}

/// `BASE64URL(SHA256(verifier))`, unpadded.
pub fn code_challenge_s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// `len` random bytes, base64url-encoded without padding.
pub(crate) fn random_urlsafe(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_pair_is_consistent() {
        let pair = PkcePair::generate();
        assert!(pair.code_verifier.len() >= 43);
        assert!(pair.code_verifier.len() <= 128);
        assert_eq!(pair.code_challenge, code_challenge_s256(&pair.code_verifier));
    }

    #[test]
    fn rfc7636_appendix_b_vector() {
        assert_eq!(
            code_challenge_s256("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn random_values_differ() {
        assert_ne!(random_urlsafe(32), random_urlsafe(32));
    }
}
