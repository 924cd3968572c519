//! File type detection from leading magic bytes

/// Signature table, checked in order. Longer prefixes sit before shorter
/// ones that could overlap with them.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", ".png"),
    (b"\xff\xd8", ".jpeg"),
    (b"GIF8", ".gif"),
    (b"%PDF", ".pdf"),
    (b"PK", ".zip"),
    (b"RIFF", ".webp"),
];

/// Guess a file extension (with leading dot) from the first bytes of `data`.
///
/// Returns an empty string when no known signature matches.
pub fn detect_extension(data: &[u8]) -> &'static str {
    SIGNATURES
        .iter()
        .find(|(magic, _)| data.starts_with(magic))
        .map(|(_, ext)| *ext)
        .unwrap_or("")
}
