//! Idempotency keys for outbound gateway calls.
//!
//! The gateway collapses duplicate requests carrying the same key, so a
//! network-level retry of an unanswered call does not double-charge.
//!
//! Caller contract: generate a fresh key per *logical* checkout attempt and
//! reuse that key when retrying the same attempt after a send failure. A new
//! attempt (user clicks "pay" again) gets a new key.

use chrono::Utc;
use rand::Rng;

/// Generate a new idempotency key.
///
/// Random base-36 fragment plus a timestamp-derived base-36 fragment. Not
/// cryptographically hardened; the gateway's idempotency window is short and
/// keyed per request, so collision resistance in practice is what matters.
pub fn new_idempotency_key() -> String {
    let random: u64 = rand::thread_rng().gen();
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    format!("{}{}", to_base36(random), to_base36(millis))
}

fn to_base36(mut value: u64) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 alphabet is ASCII")
}
