//! On-disk layout of a task store.
//!
//! ```text
//! <root>/
//!   boards/
//!     <board_id>/
//!       board.yaml            (board record: id, name, lists)
//!       cards/
//!         <card_id>.yaml      (one file per card)
//! ```
//!
//! The layout is shared with anything that reads the tree directly (the
//! change watcher, or a person with an editor), so these helpers are pure and
//! never touch the filesystem.

use std::path::{Path, PathBuf};

use crate::types::{BoardId, CardId};

/// Extension of every record file.
pub const RECORD_EXT: &str = "yaml";
/// Directory under the root holding one directory per board.
pub const BOARDS_DIR: &str = "boards";
/// Directory under a board holding its card records.
pub const CARDS_DIR: &str = "cards";
/// File name of a board record inside its board directory.
pub const BOARD_FILE: &str = "board.yaml";

/// `<root>/boards/`
pub fn boards_dir(root: &Path) -> PathBuf {
    root.join(BOARDS_DIR)
}

/// `<root>/boards/<board>/`
pub fn board_dir(root: &Path, board: &BoardId) -> PathBuf {
    boards_dir(root).join(&board.0)
}

/// `<root>/boards/<board>/board.yaml`
pub fn board_file(root: &Path, board: &BoardId) -> PathBuf {
    board_dir(root, board).join(BOARD_FILE)
}

/// `<root>/boards/<board>/cards/`
pub fn cards_dir(root: &Path, board: &BoardId) -> PathBuf {
    board_dir(root, board).join(CARDS_DIR)
}

/// `<root>/boards/<board>/cards/<card>.yaml`
pub fn card_file(root: &Path, board: &BoardId, card: &CardId) -> PathBuf {
    cards_dir(root, board).join(format!("{}.{RECORD_EXT}", card.0))
}

/// True when `path` names a record file (by extension only).
pub fn is_record_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == RECORD_EXT)
        .unwrap_or(false)
}
