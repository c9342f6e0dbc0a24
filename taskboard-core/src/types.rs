//! Domain types for the task board.
//!
//! All types are serializable/deserializable via serde + serde_yaml; field
//! names match the on-disk record format so files stay hand-editable.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a board. Doubles as its directory name under `boards/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct BoardId(pub String);

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BoardId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BoardId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for BoardId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a card: `YYYYMMDD-NNN`, issued by the store.
///
/// Treat it as an opaque string; the sequence part grows past three digits
/// after the 999th card of a day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CardId(pub String);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CardId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for CardId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A named column of a board. Lives only inside the board record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
}

impl List {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A board record: `boards/<id>/board.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    #[serde(default)]
    pub lists: Vec<List>,
}

impl Board {
    /// Checks the board invariants: id and name present, at least one list,
    /// every list named and identified, list ids unique.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.id.0.is_empty() {
            return Err(StoreError::validation("id", "is required"));
        }
        if self.name.is_empty() {
            return Err(StoreError::validation("name", "is required"));
        }
        if self.lists.is_empty() {
            return Err(StoreError::validation("lists", "must have at least one list"));
        }
        let mut seen = HashSet::new();
        for list in &self.lists {
            if list.id.is_empty() {
                return Err(StoreError::validation("lists.id", "is required"));
            }
            if list.name.is_empty() {
                return Err(StoreError::validation("lists.name", "is required"));
            }
            if !seen.insert(list.id.as_str()) {
                return Err(StoreError::validation(
                    "lists.id",
                    format!("'{}' is duplicated", list.id),
                ));
            }
        }
        Ok(())
    }

    pub fn has_list(&self, list_id: &str) -> bool {
        self.lists.iter().any(|l| l.id == list_id)
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// One checklist entry inside a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// A card record: `boards/<board>/cards/<id>.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub id: CardId,
    pub title: String,
    /// Id of the owning list on the board.
    pub list: String,
    /// Sort key within the list.
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub todos: Vec<TodoItem>,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.title.is_empty() {
            return Err(StoreError::validation("title", "is required"));
        }
        if self.list.is_empty() {
            return Err(StoreError::validation("list", "is required"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn board(lists: Vec<List>) -> Board {
        Board {
            id: BoardId::from("test"),
            name: "Test".to_string(),
            lists,
        }
    }

    #[test]
    fn newtype_display() {
        assert_eq!(BoardId::from("b1").to_string(), "b1");
        assert_eq!(CardId::from("20260101-001").to_string(), "20260101-001");
    }

    #[rstest]
    #[case::missing_id(Board { id: BoardId::default(), ..board(vec![List::new("todo", "Todo")]) }, "id")]
    #[case::missing_name(Board { name: String::new(), ..board(vec![List::new("todo", "Todo")]) }, "name")]
    #[case::no_lists(board(vec![]), "lists")]
    #[case::list_missing_id(board(vec![List::new("", "Todo")]), "lists.id")]
    #[case::list_missing_name(board(vec![List::new("todo", "")]), "lists.name")]
    #[case::duplicate_list(board(vec![List::new("todo", "A"), List::new("todo", "B")]), "lists.id")]
    fn invalid_boards_name_the_field(#[case] board: Board, #[case] field: &str) {
        match board.validate() {
            Err(StoreError::Validation { field: got, .. }) => assert_eq!(got, field),
            other => panic!("expected validation error on {field}, got {other:?}"),
        }
    }

    #[test]
    fn valid_board_passes() {
        board(vec![List::new("todo", "Todo"), List::new("done", "Done")])
            .validate()
            .expect("valid");
    }

    #[rstest]
    #[case("todo", true)]
    #[case("done", true)]
    #[case("in-progress", false)]
    fn has_list_matches_by_id(#[case] id: &str, #[case] expected: bool) {
        let b = board(vec![List::new("todo", "Todo"), List::new("done", "Done")]);
        assert_eq!(b.has_list(id), expected);
    }

    #[test]
    fn card_without_todos_or_labels_deserializes() {
        let yaml = "id: 20260101-001\ntitle: x\nlist: todo\ncreated_at: 2026-01-01T00:00:00Z\nupdated_at: 2026-01-01T00:00:00Z\n";
        let card: Card = serde_yaml::from_str(yaml).expect("deserialize");
        assert_eq!(card.id, CardId::from("20260101-001"));
        assert!(card.todos.is_empty());
        assert!(card.labels.is_empty());
        assert_eq!(card.order, 0);
        assert!(!card.archived);
    }

    #[test]
    fn card_validate_requires_title_and_list() {
        let now = Utc::now();
        let mut card = Card {
            id: CardId::default(),
            title: String::new(),
            list: "todo".into(),
            order: 0,
            description: String::new(),
            labels: vec![],
            todos: vec![],
            archived: false,
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(card.validate(), Err(StoreError::Validation { ref field, .. }) if field == "title"));
        card.title = "x".into();
        card.list.clear();
        assert!(matches!(card.validate(), Err(StoreError::Validation { ref field, .. }) if field == "list"));
    }
}
