//! Short random tokens for the mux inbox subject tree.
//!
//! Generated with `rand` rather than pulling in a dedicated id crate, since
//! the only requirement here is "practically unique within one process
//! lifetime", not a globally-sortable identifier.

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const LEN: usize = 22;

/// Generates a random token suitable as an inbox prefix (`_INBOX.<token>`)
/// or a per-request trailing token (`_INBOX.<prefix>.<token>`).
pub fn next() -> String {
    let mut rng = rand::thread_rng();
    (0..LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ALPHABET.len());
            ALPHABET[idx] as char
        })
        .collect()
}
