//! CLI command implementations.

pub mod bloom;
pub mod dump;
pub mod encode;
pub mod replay;

/// Renders bytes as text when printable, otherwise as `0x`-prefixed hex.
///
/// The output parses back to the same bytes with [`encode::parse_bytes`].
pub fn render_bytes(bytes: &[u8]) -> String {
    let printable = !bytes.is_empty()
        && !bytes.starts_with(b"0x")
        && bytes != b"\"\""
        && bytes.iter().all(|b| b.is_ascii_graphic());
    if printable {
        String::from_utf8_lossy(bytes).into_owned()
    } else if bytes.is_empty() {
        "\"\"".to_string()
    } else {
        format!("0x{}", hex_encode(bytes))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
