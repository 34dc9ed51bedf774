//! Natural keys
//!
//! Id-independent identities used to recognise the same node or item in a
//! different store. Names are NFC-normalised so that precomposed and
//! decomposed Vietnamese/Japanese text ("Bài" typed two ways) compare equal.

use crate::types::PartitionAddress;
use unicode_normalization::UnicodeNormalization;

/// NFC, trimmed, inner whitespace runs collapsed to one space.
pub fn normalize_name(name: &str) -> String {
    let nfc: String = name.nfc().collect();
    nfc.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn update_field(hasher: &mut blake3::Hasher, field: &str) {
    // Length prefix keeps ("ab","c") and ("a","bc") apart
    hasher.update(&(field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

/// Key of a node: its normalised name, full address, and parent's key.
pub fn node_natural_key(name: &str, address: &PartitionAddress, parent_key: Option<&str>) -> String {
    let mut hasher = blake3::Hasher::new();
    update_field(&mut hasher, "node");
    update_field(&mut hasher, &normalize_name(name));
    update_field(&mut hasher, &address.partition);
    for (axis, value) in &address.selectors {
        update_field(&mut hasher, axis);
        update_field(&mut hasher, value);
    }
    update_field(&mut hasher, parent_key.unwrap_or(""));
    hex::encode(hasher.finalize().as_bytes())
}

/// Content key of an item payload.
///
/// Uses the string at `key_field` when the payload has one, otherwise the
/// canonical JSON of the whole payload (object keys are sorted).
pub fn item_natural_key(payload: &serde_json::Value, key_field: Option<&str>) -> String {
    if let Some(text) = key_field
        .and_then(|field| payload.get(field))
        .and_then(|value| value.as_str())
    {
        let normalized = normalize_name(text);
        if !normalized.is_empty() {
            return format!("field:{}", normalized);
        }
    }
    format!("json:{}", payload)
}
