use sha2::{Digest, Sha256};

// Keeps ("ab", "c") and ("a", "bc") from hashing the same.
const FIELD_SEPARATOR: u8 = 0x1f;

fn digest(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
    }
    format!("{:x}", hasher.finalize())
}

/// Fingerprint of the playlist fields shown to users.
pub fn playlist_fingerprint(title: &str, thumbnail: &str, item_count: i64) -> String {
    digest(&[title, thumbnail, item_count.to_string().as_str()])
}

/// Fingerprint of the item fields shown to users.
pub fn item_fingerprint(title: &str, thumbnail: &str, position: i64) -> String {
    digest(&[title, thumbnail, position.to_string().as_str()])
}
