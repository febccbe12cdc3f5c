use sha2::{Digest, Sha256};

/// Random part of a session id, in bytes.
const TOKEN_BYTES: usize = 32;
const TOKEN_PREFIX: &str = "sf_";

/// Mint a fresh session id.
///
/// The first value goes into the `sid` cookie; the second is the key the
/// session store files it under, so a dump of the store holds no usable cookie.
pub fn generate_session_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::fill(&mut bytes);
    let raw = format!("{TOKEN_PREFIX}{}", hex::encode(bytes));
    let key = hash_token(&raw);
    (raw, key)
}

/// Store key for a cookie value: lowercase hex SHA-256.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
