//! The load balancer's own affinity cookie.

use rand::Rng;

/// Cookie name carrying the affinity token.
pub const AFFINITY_COOKIE: &str = "LDBLNCNGCK";

/// Token length in characters.
pub const TOKEN_LEN: usize = 20;

/// URL-safe base64 alphabet.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// A fresh random affinity token.
pub fn new_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
