//! Static keysym lookup tables
//!
//! Three tables feed the resolver:
//!
//! - [`UNSHIFTED_KEYSYMS`]: raw host key codes of non-typable keys to their
//!   unshifted keysym
//! - [`SHIFTED_KEYSYMS`]: overrides for the few codes whose keysym changes
//!   while shift is held
//! - [`IDENTIFIER_KEYSYMS`]: symbolic host key identifiers to keysyms
//!
//! An entry mapped to `None` is a key the host is known to report but which
//! has no keysym equivalent. It resolves exactly like a missing entry.

use crate::keysym::Keysym;

const fn sym(value: u32) -> Option<Keysym> {
    Some(Keysym::new(value))
}

/// Raw codes of keys which do not produce typable characters.
pub const UNSHIFTED_KEYSYMS: &[(u32, Option<Keysym>)] = &[
    (8, sym(0xFF08)),   // backspace
    (9, sym(0xFF09)),   // tab
    (13, sym(0xFF0D)),  // enter
    (16, sym(0xFFE1)),  // shift
    (17, sym(0xFFE3)),  // ctrl
    (18, sym(0xFFE9)),  // alt
    (19, sym(0xFF13)),  // pause/break
    (20, sym(0xFFE5)),  // caps lock
    (27, sym(0xFF1B)),  // escape
    (32, sym(0x0020)),  // space
    (33, sym(0xFF55)),  // page up
    (34, sym(0xFF56)),  // page down
    (35, sym(0xFF57)),  // end
    (36, sym(0xFF50)),  // home
    (37, sym(0xFF51)),  // left arrow
    (38, sym(0xFF52)),  // up arrow
    (39, sym(0xFF53)),  // right arrow
    (40, sym(0xFF54)),  // down arrow
    (45, sym(0xFF63)),  // insert
    (46, sym(0xFFFF)),  // delete
    (91, sym(0xFFEB)),  // left window key (super_l)
    (92, sym(0xFF67)),  // right window key (menu)
    (93, None),         // select key
    (112, sym(0xFFBE)), // f1
    (113, sym(0xFFBF)), // f2
    (114, sym(0xFFC0)), // f3
    (115, sym(0xFFC1)), // f4
    (116, sym(0xFFC2)), // f5
    (117, sym(0xFFC3)), // f6
    (118, sym(0xFFC4)), // f7
    (119, sym(0xFFC5)), // f8
    (120, sym(0xFFC6)), // f9
    (121, sym(0xFFC7)), // f10
    (122, sym(0xFFC8)), // f11
    (123, sym(0xFFC9)), // f12
    (144, sym(0xFF7F)), // num lock
    (145, sym(0xFF14)), // scroll lock
];

/// Codes whose keysym differs while shift is held. Only codes listed here
/// are affected; everything else falls back to [`UNSHIFTED_KEYSYMS`].
pub const SHIFTED_KEYSYMS: &[(u32, Option<Keysym>)] = &[
    (18, sym(0xFFE7)), // alt -> meta
];

/// Symbolic identifiers of non-typable keys. Matched verbatim.
pub const IDENTIFIER_KEYSYMS: &[(&str, Option<Keysym>)] = &[
    ("AllCandidates", sym(0xFF3D)),
    ("Alphanumeric", sym(0xFF30)),
    ("Alt", sym(0xFFE9)),
    ("Attn", sym(0xFD0E)),
    ("AltGraph", sym(0xFFEA)),
    ("CapsLock", sym(0xFFE5)),
    ("Clear", sym(0xFF0B)),
    ("Convert", sym(0xFF23)), // Henkan, not Kanji (0xFF21)
    ("Copy", sym(0xFD15)),
    ("Crsel", sym(0xFD1C)),
    ("CodeInput", sym(0xFF37)),
    ("Control", sym(0xFFE3)),
    ("Down", sym(0xFF54)),
    ("End", sym(0xFF57)),
    ("Enter", sym(0xFF0D)),
    ("EraseEof", sym(0xFD06)),
    ("Execute", sym(0xFF62)),
    ("Exsel", sym(0xFD1B)), // 3270_ExSelect; 0xFD1D is PrintScreen
    ("F1", sym(0xFFBE)),
    ("F2", sym(0xFFBF)),
    ("F3", sym(0xFFC0)),
    ("F4", sym(0xFFC1)),
    ("F5", sym(0xFFC2)),
    ("F6", sym(0xFFC3)),
    ("F7", sym(0xFFC4)),
    ("F8", sym(0xFFC5)),
    ("F9", sym(0xFFC6)),
    ("F10", sym(0xFFC7)),
    ("F11", sym(0xFFC8)),
    ("F12", sym(0xFFC9)),
    ("F13", sym(0xFFCA)),
    ("F14", sym(0xFFCB)),
    ("F15", sym(0xFFCC)),
    ("F16", sym(0xFFCD)),
    ("F17", sym(0xFFCE)),
    ("F18", sym(0xFFCF)),
    ("F19", sym(0xFFD0)),
    ("F20", sym(0xFFD1)),
    ("F21", sym(0xFFD2)),
    ("F22", sym(0xFFD3)),
    ("F23", sym(0xFFD4)),
    ("F24", sym(0xFFD5)),
    ("Find", sym(0xFF68)),
    ("FullWidth", None),
    ("HalfWidth", None),
    ("HangulMode", sym(0xFF31)),
    ("HanjaMode", sym(0xFF34)),
    ("Help", sym(0xFF6A)),
    ("Hiragana", sym(0xFF25)),
    ("Home", sym(0xFF50)),
    ("Insert", sym(0xFF63)),
    ("JapaneseHiragana", sym(0xFF25)),
    ("JapaneseKatakana", sym(0xFF26)),
    ("JapaneseRomaji", sym(0xFF24)),
    ("JunjaMode", sym(0xFF38)),
    ("KanaMode", sym(0xFF2D)),
    ("KanjiMode", sym(0xFF21)),
    ("Katakana", sym(0xFF26)),
    ("Left", sym(0xFF51)),
    ("Meta", sym(0xFFE7)),
    ("NumLock", sym(0xFF7F)),
    ("PageDown", sym(0xFF56)), // Next, same as raw code 34
    ("PageUp", sym(0xFF55)), // Prior, same as raw code 33
    ("Pause", sym(0xFF13)),
    ("PreviousCandidate", sym(0xFF3E)),
    ("PrintScreen", sym(0xFD1D)),
    ("Right", sym(0xFF53)),
    ("RomanCharacters", None),
    ("Scroll", sym(0xFF14)),
    ("Select", sym(0xFF60)),
    ("Shift", sym(0xFFE1)),
    ("Up", sym(0xFF52)),
    ("Undo", sym(0xFF65)),
    ("Win", sym(0xFFEB)),
];

/// Look up a raw code in one of the code tables.
///
/// Returns `None` when the code is not listed, `Some(None)` when it is listed
/// without a keysym.
pub fn lookup_code(table: &[(u32, Option<Keysym>)], code: u32) -> Option<Option<Keysym>> {
    table
        .iter()
        .find(|(entry, _)| *entry == code)
        .map(|(_, keysym)| *keysym)
}

/// Look up a symbolic identifier in [`IDENTIFIER_KEYSYMS`].
pub fn lookup_identifier(identifier: &str) -> Option<Option<Keysym>> {
    IDENTIFIER_KEYSYMS
        .iter()
        .find(|(entry, _)| *entry == identifier)
        .map(|(_, keysym)| *keysym)
}
