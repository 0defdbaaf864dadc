//! BLAKE3 fingerprints for audit fields and deterministic identifiers.

use blake3::Hasher;
use uuid::Uuid;

/// Namespace for deterministic observation ids (UUIDv5).
pub const OBSERVATION_NAMESPACE: Uuid = Uuid::from_u128(0x6f62_7365_7276_6174_696f_6e2d_7472_6961);

/// Hex BLAKE3 digest of the canonical text. Stamped on every evidence item so a span can be
/// checked against the exact text it was computed from.
#[inline]
pub fn hash_canonical_text(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// 32-byte key identifying one (message, label, keyword, dictionary) observation fact.
///
/// Fields are `|`-separated so `("ab", "c")` and `("a", "bc")` hash differently.
#[inline]
pub fn hash_observation_fact(
    message_id: &str,
    label_id: &str,
    candidate_id: &str,
    dict_version: u32,
) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(message_id.as_bytes());
    hasher.update(b"|");
    hasher.update(label_id.as_bytes());
    hasher.update(b"|");
    hasher.update(candidate_id.as_bytes());
    hasher.update(b"|");
    hasher.update(&dict_version.to_le_bytes());
    *hasher.finalize().as_bytes()
}

/// Deterministic UUIDv5 for an observation fact.
#[inline]
pub fn observation_uuid(
    message_id: &str,
    label_id: &str,
    candidate_id: &str,
    dict_version: u32,
) -> Uuid {
    let key = hash_observation_fact(message_id, label_id, candidate_id, dict_version);
    Uuid::new_v5(&OBSERVATION_NAMESPACE, &key)
}
