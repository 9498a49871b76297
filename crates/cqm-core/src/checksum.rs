//! CRC-32C content checksums for change detection.
//!
//! The digest is computed over canonical bytes so that a checksum persisted
//! at apply time keeps matching on later validation regardless of platform
//! line endings or a UTF-8 byte-order mark.

/// Compute the signed 32-bit checksum of a migration script.
///
/// Canonicalisation: strip one leading BOM, normalise `\r\n` and bare `\r`
/// to `\n`, then digest the UTF-8 bytes with CRC-32C.
pub fn compute_checksum(content: &str) -> i32 {
    let canonical = canonicalize(content);
    crc32c::crc32c(canonical.as_bytes()) as i32
}

/// Strip a leading BOM and normalise line endings to `\n`.
fn canonicalize(content: &str) -> String {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}
