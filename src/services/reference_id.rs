//! Idempotency keys for authorize, capture and refund calls.
//!
//! The remote API answers a repeated reference id with the result of the
//! first call, so each logical operation gets its own key.

use rand::Rng;

pub const SUFFIX_LEN: usize = 10;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// `"{payment_number}-{10 base36 chars}"`
pub fn generate(payment_number: &str) -> String {
    format!("{}-{}", payment_number, random_suffix(SUFFIX_LEN))
}
