//! File-backed board and card store.
//!
//! Every operation runs under one readers-writer lock: listings and reads
//! share it, anything that writes takes it exclusively. Sibling files (two
//! cards of one board) therefore never race, and card id issuance can be
//! folded into the same critical section as the write that uses the id.
//!
//! Writes are atomic per file: serialize → `<name>.tmp` sibling → `rename`.
//! The `.tmp` file is in the same directory as the target, so the rename
//! never crosses filesystems.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{io_err, Resource, StoreError};
use crate::layout;
use crate::types::{Board, BoardId, Card, CardId};

/// Thread-safe store rooted at a directory. Share it behind an `Arc`.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    lock: RwLock<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: RwLock::new(()),
        }
    }

    /// Root directory; the change watcher observes this tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // The lock guards no data, so a panic while holding it cannot leave
    // anything half-updated in memory.
    fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // 1. Boards
    // -----------------------------------------------------------------------

    /// All boards under the root, sorted by id.
    ///
    /// A missing root yields an empty list. Board directories whose record is
    /// missing or malformed are skipped with a warning.
    pub fn list_boards(&self) -> Result<Vec<Board>, StoreError> {
        let _guard = self.shared();

        let dir = layout::boards_dir(&self.root);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(io_err(&dir, err)),
        };

        let mut ids: Vec<BoardId> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| BoardId::from(e.file_name().to_string_lossy().into_owned()))
            .collect();
        ids.sort();

        let mut boards = Vec::with_capacity(ids.len());
        for id in ids {
            match self.read_board(&id) {
                Ok(board) => boards.push(board),
                Err(err) => {
                    tracing::warn!(board = %id, error = %err, "skipping unreadable board");
                }
            }
        }
        Ok(boards)
    }

    /// Load one board; `NotFound` if its record file is absent.
    pub fn get_board(&self, id: &BoardId) -> Result<Board, StoreError> {
        let _guard = self.shared();
        self.read_board(id)
    }

    /// Create the board directory (and its empty `cards/`) if needed, then
    /// overwrite the board record.
    pub fn save_board(&self, board: &Board) -> Result<(), StoreError> {
        let _guard = self.exclusive();

        let cards = layout::cards_dir(&self.root, &board.id);
        fs::create_dir_all(&cards).map_err(|e| io_err(&cards, e))?;
        write_record(&layout::board_file(&self.root, &board.id), board)
    }

    /// Remove a board and every card under it.
    pub fn delete_board(&self, id: &BoardId) -> Result<(), StoreError> {
        let _guard = self.exclusive();

        let dir = layout::board_dir(&self.root, id);
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StoreError::not_found(Resource::Board, id)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::not_found(Resource::Board, id))
            }
            Err(err) => return Err(io_err(&dir, err)),
        }
        fs::remove_dir_all(&dir).map_err(|e| io_err(&dir, e))
    }

    fn read_board(&self, id: &BoardId) -> Result<Board, StoreError> {
        read_record(&layout::board_file(&self.root, id), Resource::Board, id)
    }

    // -----------------------------------------------------------------------
    // 2. Cards
    // -----------------------------------------------------------------------

    /// Cards of a board in render order: by list id, then order, then card id.
    ///
    /// Archived cards are dropped unless `include_archived`. A missing cards
    /// directory yields an empty list; unreadable card files are skipped.
    pub fn list_cards(
        &self,
        board_id: &BoardId,
        include_archived: bool,
    ) -> Result<Vec<Card>, StoreError> {
        let _guard = self.shared();

        let mut cards: Vec<Card> = self
            .card_ids(board_id)?
            .into_iter()
            .filter_map(|card_id| match self.read_card(board_id, &card_id) {
                Ok(card) => Some(card),
                Err(err) => {
                    tracing::warn!(
                        board = %board_id,
                        card = %card_id,
                        error = %err,
                        "skipping unreadable card",
                    );
                    None
                }
            })
            .filter(|card| include_archived || !card.archived)
            .collect();

        cards.sort_by(|a, b| {
            a.list
                .cmp(&b.list)
                .then(a.order.cmp(&b.order))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(cards)
    }

    /// Load one card; `NotFound` if its record file is absent.
    pub fn get_card(&self, board_id: &BoardId, card_id: &CardId) -> Result<Card, StoreError> {
        let _guard = self.shared();
        self.read_card(board_id, card_id)
    }

    /// Overwrite a card record under `card.id`, creating directories as needed.
    pub fn save_card(&self, board_id: &BoardId, card: &Card) -> Result<(), StoreError> {
        let _guard = self.exclusive();
        self.write_card(board_id, card)
    }

    pub fn delete_card(&self, board_id: &BoardId, card_id: &CardId) -> Result<(), StoreError> {
        let _guard = self.exclusive();

        let path = layout::card_file(&self.root, board_id, card_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StoreError::not_found(Resource::Card, card_id))
            }
            Err(err) => Err(io_err(&path, err)),
        }
    }

    // -----------------------------------------------------------------------
    // 3. Id issuance
    // -----------------------------------------------------------------------

    /// The id the next card created today would get. Nothing is reserved:
    /// use [`FileStore::create_card`] to issue and persist in one step.
    pub fn next_id(&self, board_id: &BoardId) -> Result<CardId, StoreError> {
        let _guard = self.shared();
        self.next_id_on(board_id, today())
    }

    /// Issue the next id for today, stamp it on `card` and persist the card,
    /// all inside one exclusive section. Concurrent callers get distinct,
    /// consecutive ids.
    pub fn create_card(&self, board_id: &BoardId, card: &mut Card) -> Result<CardId, StoreError> {
        let _guard = self.exclusive();

        let id = self.next_id_on(board_id, today())?;
        card.id = id.clone();
        self.write_card(board_id, card)?;
        Ok(id)
    }

    fn next_id_on(&self, board_id: &BoardId, day: NaiveDate) -> Result<CardId, StoreError> {
        let prefix = format!("{}-", day.format("%Y%m%d"));
        // Suffixes with no successor in u64 cannot be followed; skip them.
        let next_seq = self
            .card_ids(board_id)?
            .iter()
            .filter_map(|id| id.0.strip_prefix(&prefix))
            .filter(|seq| !seq.is_empty() && seq.bytes().all(|b| b.is_ascii_digit()))
            .filter_map(|seq| seq.parse::<u64>().ok()?.checked_add(1))
            .max()
            .unwrap_or(1);
        Ok(CardId(format!("{prefix}{next_seq:03}")))
    }

    // -----------------------------------------------------------------------
    // Private helpers (callers hold the lock)
    // -----------------------------------------------------------------------

    /// Ids of every card record file of a board, sorted. Missing dir → empty.
    fn card_ids(&self, board_id: &BoardId) -> Result<Vec<CardId>, StoreError> {
        let dir = layout::cards_dir(&self.root, board_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(io_err(&dir, err)),
        };

        let mut ids: Vec<CardId> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| layout::is_record_file(p))
            .filter_map(|p| {
                p.file_stem()
                    .map(|stem| CardId::from(stem.to_string_lossy().into_owned()))
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn read_card(&self, board_id: &BoardId, card_id: &CardId) -> Result<Card, StoreError> {
        read_record(
            &layout::card_file(&self.root, board_id, card_id),
            Resource::Card,
            card_id,
        )
    }

    fn write_card(&self, board_id: &BoardId, card: &Card) -> Result<(), StoreError> {
        let dir = layout::cards_dir(&self.root, board_id);
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        write_record(&layout::card_file(&self.root, board_id, &card.id), card)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn read_record<T: DeserializeOwned>(
    path: &Path,
    resource: Resource,
    id: impl std::fmt::Display,
) -> Result<T, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(StoreError::not_found(resource, id))
        }
        Err(err) => return Err(io_err(path, err)),
    };
    serde_yaml::from_str(&contents).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<(), StoreError> {
    let yaml = serde_yaml::to_string(record)?;
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_err(path, err));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
