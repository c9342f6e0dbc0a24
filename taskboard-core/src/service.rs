//! Board and card business rules on top of [`FileStore`].
//!
//! The store persists whatever it is given; this layer validates input,
//! checks that referenced boards and lists exist, merges partial updates and
//! stamps timestamps.

use chrono::Utc;

use crate::error::{Resource, StoreError};
use crate::store::FileStore;
use crate::types::{Board, BoardId, Card, CardId, List, TodoItem};

// ---------------------------------------------------------------------------
// Boards
// ---------------------------------------------------------------------------

/// Partial board update. Empty fields leave the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct BoardPatch {
    pub name: Option<String>,
    pub lists: Option<Vec<List>>,
}

/// Validate and persist a new board. `Conflict` if the id is taken.
pub fn create_board(store: &FileStore, board: Board) -> Result<Board, StoreError> {
    board.validate()?;
    match store.get_board(&board.id) {
        Ok(_) => return Err(StoreError::conflict(Resource::Board, &board.id)),
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(err),
    }
    store.save_board(&board)?;
    tracing::info!(board = %board.id, "board created");
    Ok(board)
}

pub fn update_board(store: &FileStore, id: &BoardId, patch: BoardPatch) -> Result<Board, StoreError> {
    let mut board = store.get_board(id)?;
    if let Some(name) = patch.name.filter(|n| !n.is_empty()) {
        board.name = name;
    }
    if let Some(lists) = patch.lists.filter(|l| !l.is_empty()) {
        board.lists = lists;
    }
    board.validate()?;
    store.save_board(&board)?;
    Ok(board)
}

pub fn delete_board(store: &FileStore, id: &BoardId) -> Result<(), StoreError> {
    store.delete_board(id)?;
    tracing::info!(board = %id, "board deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Input for [`create_card`]. The id and timestamps are assigned here.
#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub title: String,
    pub list: String,
    pub order: i64,
    pub description: String,
    pub labels: Vec<String>,
    pub todos: Vec<TodoItem>,
}

/// Partial card update. `None` (or an empty title/description) keeps the
/// stored value.
#[derive(Debug, Clone, Default)]
pub struct CardPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub labels: Option<Vec<String>>,
    pub todos: Option<Vec<TodoItem>>,
}

/// Cards of an existing board in render order.
pub fn list_cards(
    store: &FileStore,
    board_id: &BoardId,
    include_archived: bool,
) -> Result<Vec<Card>, StoreError> {
    store.get_board(board_id)?;
    store.list_cards(board_id, include_archived)
}

pub fn create_card(store: &FileStore, board_id: &BoardId, new: NewCard) -> Result<Card, StoreError> {
    let board = store.get_board(board_id)?;
    let now = Utc::now();
    let mut card = Card {
        id: CardId::default(),
        title: new.title,
        list: new.list,
        order: new.order,
        description: new.description,
        labels: new.labels,
        todos: new.todos,
        archived: false,
        created_at: now,
        updated_at: now,
    };
    card.validate()?;
    ensure_list(&board, &card.list)?;

    let id = store.create_card(board_id, &mut card)?;
    tracing::info!(board = %board_id, card = %id, "card created");
    Ok(card)
}

pub fn update_card(
    store: &FileStore,
    board_id: &BoardId,
    card_id: &CardId,
    patch: CardPatch,
) -> Result<Card, StoreError> {
    let mut card = store.get_card(board_id, card_id)?;
    if let Some(title) = patch.title.filter(|t| !t.is_empty()) {
        card.title = title;
    }
    if let Some(description) = patch.description.filter(|d| !d.is_empty()) {
        card.description = description;
    }
    if let Some(labels) = patch.labels {
        card.labels = labels;
    }
    if let Some(todos) = patch.todos {
        card.todos = todos;
    }
    card.updated_at = Utc::now();
    store.save_card(board_id, &card)?;
    Ok(card)
}

/// Move a card to `to_list` at position `order`.
pub fn move_card(
    store: &FileStore,
    board_id: &BoardId,
    card_id: &CardId,
    to_list: &str,
    order: i64,
) -> Result<Card, StoreError> {
    let board = store.get_board(board_id)?;
    ensure_list(&board, to_list)?;

    let mut card = store.get_card(board_id, card_id)?;
    card.list = to_list.to_string();
    card.order = order;
    card.updated_at = Utc::now();
    store.save_card(board_id, &card)?;
    Ok(card)
}

pub fn archive_card(
    store: &FileStore,
    board_id: &BoardId,
    card_id: &CardId,
    archived: bool,
) -> Result<Card, StoreError> {
    let mut card = store.get_card(board_id, card_id)?;
    card.archived = archived;
    card.updated_at = Utc::now();
    store.save_card(board_id, &card)?;
    Ok(card)
}

pub fn delete_card(store: &FileStore, board_id: &BoardId, card_id: &CardId) -> Result<(), StoreError> {
    store.delete_card(board_id, card_id)
}

fn ensure_list(board: &Board, list_id: &str) -> Result<(), StoreError> {
    if board.has_list(list_id) {
        Ok(())
    } else {
        Err(StoreError::validation(
            "list",
            format!("list '{list_id}' does not exist in board"),
        ))
    }
}
