//! Taskboard core library: domain types, file-backed store, business rules.
//!
//! - [`types`]: boards, lists, cards and their id newtypes
//! - [`error`]: [`StoreError`] and its [`ErrorKind`] classification
//! - [`layout`]: where records live under the store root
//! - [`store`]: [`FileStore`], locked CRUD plus card id issuance
//! - [`service`]: validation, existence checks and partial updates

pub mod error;
pub mod layout;
pub mod service;
pub mod store;
pub mod types;

pub use error::{ErrorKind, Resource, StoreError};
pub use store::FileStore;
pub use types::{Board, BoardId, Card, CardId, List, TodoItem};
