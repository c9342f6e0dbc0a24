//! Change notifications pushed to live clients.
//!
//! Wire shape:
//! `{"type": "board_updated"|"card_updated", "board_id": "<id>", "timestamp": "<RFC3339>"}`

use std::path::{Component, Path};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use taskboard_core::layout::{self, BOARDS_DIR, CARDS_DIR};
use taskboard_core::BoardId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    BoardUpdated,
    CardUpdated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub board_id: BoardId,
    pub timestamp: String,
}

impl ChangeEvent {
    pub fn now(kind: ChangeKind, board_id: BoardId) -> Self {
        Self {
            kind,
            board_id,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Map a changed path to the board it belongs to.
///
/// Only record files under `<root>/boards/<board>/…` classify; anything
/// under `<board>/cards/` is a card change, everything else in the board
/// directory is a board change. Paths that do not fit yield `None`.
pub fn classify(root: &Path, path: &Path) -> Option<ChangeEvent> {
    if !layout::is_record_file(path) {
        return None;
    }
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Option<_>>()?;

    if parts.len() < 3 || parts[0] != BOARDS_DIR {
        return None;
    }

    let kind = if parts.len() >= 4 && parts[2] == CARDS_DIR {
        ChangeKind::CardUpdated
    } else {
        ChangeKind::BoardUpdated
    };
    Some(ChangeEvent::now(kind, BoardId::from(parts[1])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/data/boards/b1/board.yaml", Some((ChangeKind::BoardUpdated, "b1")))]
    #[case("/data/boards/b1/cards/20260101-001.yaml", Some((ChangeKind::CardUpdated, "b1")))]
    #[case("/data/boards/b1/cards/nested/x.yaml", Some((ChangeKind::CardUpdated, "b1")))]
    #[case("/data/boards/b1/other.yaml", Some((ChangeKind::BoardUpdated, "b1")))]
    #[case("/data/boards/b1/board.yaml.tmp", None)]
    #[case("/data/boards/b1/cards/notes.md", None)]
    #[case("/data/boards/top.yaml", None)]
    #[case("/data/settings.yaml", None)]
    #[case("/elsewhere/boards/b1/board.yaml", None)]
    fn classification(#[case] path: &str, #[case] expected: Option<(ChangeKind, &str)>) {
        let got = classify(Path::new("/data"), Path::new(path))
            .map(|ev| (ev.kind, ev.board_id.0));
        assert_eq!(got, expected.map(|(k, b)| (k, b.to_string())));
    }

    #[test]
    fn payload_matches_wire_shape() {
        let event = ChangeEvent::now(ChangeKind::CardUpdated, BoardId::from("b1"));
        let value: serde_json::Value =
            serde_json::from_slice(&event.to_payload().expect("encode")).expect("decode");

        assert_eq!(value["type"], "card_updated");
        assert_eq!(value["board_id"], "b1");
        let ts = value["timestamp"].as_str().expect("timestamp string");
        chrono::DateTime::parse_from_rfc3339(ts).expect("RFC3339 timestamp");
        assert_eq!(value.as_object().map(|o| o.len()), Some(3));
    }
}
