use sha2::{Digest, Sha256};

/// Stable RGB colour for a prompt, taken from the head of its SHA-256 digest.
pub fn prompt_color(prompt: &str) -> [u8; 3] {
    let digest = Sha256::digest(prompt.as_bytes());
    [digest[0], digest[1], digest[2]]
}
