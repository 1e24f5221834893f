use sha2::{Digest, Sha256};

/// Number of bytes in one scoring window.
pub const WINDOW_LEN: usize = 4;

/// Number of non-overlapping windows in a SHA-256 digest.
pub const WINDOW_COUNT: usize = 32 / WINDOW_LEN;

/// One-way digest used by every resonance derivation.
pub fn resonance_digest(input: &[u8]) -> [u8; 32] {
    Sha256::digest(input).into()
}

/// Read window `index` of a digest as a big-endian `u32`.
///
/// Window `i` covers bytes `[4i, 4i + 4)`, so distinct indices never overlap.
/// Returns `None` for an index past the end of the digest.
pub fn digest_window(digest: &[u8; 32], index: usize) -> Option<u32> {
    if index >= WINDOW_COUNT {
        return None;
    }
    let start = index * WINDOW_LEN;
    let mut window = [0u8; WINDOW_LEN];
    window.copy_from_slice(&digest[start..start + WINDOW_LEN]);
    Some(u32::from_be_bytes(window))
}

/// Hex rendering of a digest, for diagnostics and golden-vector tests.
pub fn digest_hex(digest: &[u8; 32]) -> String {
    hex::encode(digest)
}
