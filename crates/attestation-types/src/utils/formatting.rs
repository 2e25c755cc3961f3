//! Shortening of hashes for log fields.

/// Keeps `0x` plus the first eight hex digits of a hash, followed by "..".
/// Shorter input is returned unchanged.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(10) {
		Some((cut, _)) => format!("{}..", &id[..cut]),
		None => id.to_string(),
	}
}
