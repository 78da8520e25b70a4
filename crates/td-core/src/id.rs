//! Identifier mint.
//!
//! IDs have the shape `<prefix><hex>`: 6 hex chars for issues, 4 for
//! work-sessions, 8 for everything else (sessions, action-log/involvement
//! entries that need an external id, boards, notes, ...). `normalize`
//! accepts a bare hex string or an already-prefixed one and returns the
//! canonical prefixed form, so callers may omit the prefix when addressing
//! an entity by ID.

use crate::error::{TdError, TdResult};
use rand::RngCore;

/// Maximum number of regeneration attempts on an insertion collision
/// before giving up.
pub const MAX_COLLISION_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Issue,
    WorkSession,
    Session,
    ActionLog,
    Involvement,
    Log,
    Handoff,
    Comment,
    GitSnapshot,
    IssueFile,
    Board,
    Note,
}

impl IdKind {
    pub fn prefix(self) -> &'static str {
        match self {
            IdKind::Issue => "td-",
            IdKind::WorkSession => "ws_",
            IdKind::Session => "ses_",
            IdKind::ActionLog => "al-",
            IdKind::Involvement => "inv-",
            IdKind::Log => "log-",
            IdKind::Handoff => "ho-",
            IdKind::Comment => "cm-",
            IdKind::GitSnapshot => "gs-",
            IdKind::IssueFile => "if-",
            IdKind::Board => "bd-",
            IdKind::Note => "nt-",
        }
    }

    pub fn hex_len(self) -> usize {
        match self {
            IdKind::Issue => 6,
            IdKind::WorkSession => 4,
            _ => 8,
        }
    }
}

/// Generate a fresh ID of the given kind using a cryptographic RNG.
pub fn generate(kind: IdKind) -> String {
    let mut bytes = vec![0u8; kind.hex_len().div_ceil(2)];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{}{}", kind.prefix(), &hex[..kind.hex_len()])
}

/// Normalize a caller-supplied identifier to its canonical prefixed form.
///
/// Accepts either the full `<prefix><hex>` form or a bare hex string.
/// `normalize(normalize(x)) == normalize(x)` for all strings (idempotence).
pub fn normalize(kind: IdKind, raw: &str) -> TdResult<String> {
    let raw = raw.trim();
    let hex_part = raw.strip_prefix(kind.prefix()).unwrap_or(raw);
    if hex_part.len() != kind.hex_len() || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(TdError::InvalidInput(format!(
                    "'{raw}' is not a valid {} id",
                    kind.prefix()
        )));
    }
    Ok(format!("{}{}", kind.prefix(), hex_part.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_have_expected_shape() {
        let id = generate(IdKind::Issue);
        assert!(id.starts_with("td-"));
        assert_eq!(id.len(), 3 + 6);

        let ses = generate(IdKind::Session);
        assert!(ses.starts_with("ses_"));
        assert_eq!(ses.len(), 4 + 8);
    }

    #[test]
    fn normalize_accepts_bare_and_prefixed() {
        let id = generate(IdKind::Issue);
        let bare = id.strip_prefix("td-").unwrap();
        assert_eq!(normalize(IdKind::Issue, bare).unwrap(), id);
        assert_eq!(normalize(IdKind::Issue, &id).unwrap(), id);
    }

    #[test]
    fn normalize_is_idempotent() {
        let id = generate(IdKind::Session);
        let once = normalize(IdKind::Session, &id).unwrap();
        let twice = normalize(IdKind::Session, &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_rejects_wrong_length_or_non_hex() {
        assert!(normalize(IdKind::Issue, "td-xyz").is_err());
        assert!(normalize(IdKind::Issue, "td-abcdefg").is_err());
        assert!(normalize(IdKind::Issue, "zzzzzz").is_err());
    }

    #[test]
    fn normalize_lowercases_hex() {
        let id = generate(IdKind::Issue);
        let upper = id.to_ascii_uppercase();
        assert_eq!(normalize(IdKind::Issue, &upper).unwrap(), id);
    }
}
