//! Hex text ↔ raw byte conversion for manually submitted commands.
//!
//! Operators type commands the way camera manuals print them:
//! `"81 01 04 07 02 FF"`.  Whitespace between digits is ignored, case does not
//! matter, and responses are rendered back as lowercase hex without spaces.

use crate::error::BridgeError;

/// Parses an operator-typed hex string into raw command bytes.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidInput`] if the string is empty (after removing
/// whitespace), has an odd number of digits, or contains a non-hex character.
///
/// # Examples
///
/// ```rust
/// use visca_core::parse_hex_command;
///
/// assert_eq!(
///     parse_hex_command("81 01 04 07 02 FF").unwrap(),
///     vec![0x81, 0x01, 0x04, 0x07, 0x02, 0xFF]
/// );
/// assert!(parse_hex_command("zz").is_err());
/// ```
pub fn parse_hex_command(input: &str) -> Result<Vec<u8>, BridgeError> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(BridgeError::InvalidInput("empty command".to_string()));
    }
    hex::decode(&compact).map_err(|e| BridgeError::InvalidInput(e.to_string()))
}

/// Renders bytes as lowercase hex without separators (`90 41 FF` → `"9041ff"`).
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
