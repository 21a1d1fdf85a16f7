//! Deterministic account-number hashing: lets the return/correction
//! processor look up a depository from `(routing number, account number)`
//! carried in a return file without ever decrypting the stored cleartext
//! (spec §3 Depository invariants, §4.4 step 4).

use sha2::{Digest, Sha256};

pub fn hash_account_number(routing_number: &ach_types::RoutingNumber, account_number: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(routing_number.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(account_number.trim().as_bytes());
    hasher.finalize().into()
}

/// Hex form of a hashed account number, for log fields: lets an operator
/// correlate "no depository found" warnings across a run without ever
/// printing the cleartext account number the hash was derived from.
pub fn hash_account_number_hex(hash: &[u8; 32]) -> String {
    hex::encode(hash)
}
