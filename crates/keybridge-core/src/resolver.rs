//! Keysym resolution
//!
//! Pure functions turning host key data into keysyms. Every lookup is total:
//! anything that cannot be mapped comes back as `None` and is dropped by the
//! coalescer.

use crate::keysym::Keysym;
use crate::tables::{self, SHIFTED_KEYSYMS, UNSHIFTED_KEYSYMS};

/// Marker introducing an embedded Unicode escape in a symbolic identifier.
const UNICODE_MARKER: &str = "U+";

/// Highest valid Unicode codepoint.
const MAX_CODEPOINT: u32 = 0x10_FFFF;

/// Resolve a raw host key code.
///
/// With shift active, an override from the shifted table wins; every other
/// code falls back to the unshifted table.
pub fn keysym_from_raw_code(code: u32, shift: bool) -> Option<Keysym> {
    if shift {
        if let Some(keysym) = tables::lookup_code(SHIFTED_KEYSYMS, code) {
            return keysym;
        }
    }
    tables::lookup_code(UNSHIFTED_KEYSYMS, code).flatten()
}

/// Resolve a typed character code.
///
/// - `0x00..=0x1F` and `0x7F..=0x9F` become `0xFF00 | codepoint`
/// - `0x20..=0xFF` map to themselves
/// - `0x100..=0x10FFFF` become `0x0100_0000 | codepoint`
///
/// Values beyond the Unicode range have no keysym.
pub fn keysym_from_char_code(codepoint: u32) -> Option<Keysym> {
    if is_control_character(codepoint) {
        return Some(Keysym::new(Keysym::CONTROL_CHAR_BASE | codepoint));
    }

    match codepoint {
        0x20..=0xFF => Some(Keysym::new(codepoint)),
        0x100..=MAX_CODEPOINT => Some(Keysym::new(Keysym::UNICODE_BASE | codepoint)),
        _ => None,
    }
}

/// Resolve a symbolic key identifier.
///
/// Identifiers embedding a `U+XXXX` escape are decoded and case-folded
/// (lowercase unless shift is held) before going through
/// [`keysym_from_char_code`]. Anything else is looked up verbatim in the
/// identifier table, independent of shift.
pub fn keysym_from_identifier(identifier: &str, shift: bool) -> Option<Keysym> {
    if identifier.contains(UNICODE_MARKER) {
        let codepoint = embedded_codepoint(identifier)?;
        return keysym_from_char_code(fold_case(codepoint, shift));
    }

    tables::lookup_identifier(identifier).flatten()
}

/// Whether an identifier names a key that types a character.
///
/// Only identifiers with a decodable `U+` escape of a non-control codepoint
/// count; named keys such as `Enter` are never typable.
pub fn is_typable(identifier: &str) -> bool {
    match embedded_codepoint(identifier) {
        Some(codepoint) => !is_control_character(codepoint),
        None => false,
    }
}

/// C0 and C1 control characters, DEL included.
pub fn is_control_character(codepoint: u32) -> bool {
    codepoint <= 0x1F || (0x7F..=0x9F).contains(&codepoint)
}

/// Decode the hex digits following the first `U+` in `identifier`.
///
/// Trailing garbage after the digits is ignored, so `U+0041x` still decodes.
/// An escape without any hex digits, or one that overflows, yields `None`.
fn embedded_codepoint(identifier: &str) -> Option<u32> {
    let start = identifier.find(UNICODE_MARKER)? + UNICODE_MARKER.len();
    let rest = &identifier[start..];

    let digits_len = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_hexdigit())
        .map_or(rest.len(), |(idx, _)| idx);

    if digits_len == 0 {
        return None;
    }

    u32::from_str_radix(&rest[..digits_len], 16).ok()
}

/// Lowercase (unshifted) or uppercase (shifted) a codepoint.
///
/// Only single-character mappings are applied. Codepoints that are not valid
/// chars, or whose case mapping expands to several chars, keep their first
/// mapped char or stay as they are.
fn fold_case(codepoint: u32, shift: bool) -> u32 {
    let Some(c) = char::from_u32(codepoint) else {
        return codepoint;
    };

    let folded = if shift {
        c.to_uppercase().next()
    } else {
        c.to_lowercase().next()
    };

    folded.map_or(codepoint, u32::from)
}
