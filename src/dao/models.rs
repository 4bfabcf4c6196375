use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Registered player persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Unique username, also the owner key of the board cells.
    pub username: String,
    /// Argon2 PHC string of the user's password.
    pub password_hash: String,
    /// Account creation time.
    pub created_at: SystemTime,
}

/// One persisted board cell (`{id, phrase_text, checked, position}` keyed by owner).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellEntity {
    /// Stable identity of the cell for the lifetime of its board.
    pub id: Uuid,
    /// Username owning the board this cell belongs to.
    pub username: String,
    /// Phrase text drawn from the phrase pool.
    pub phrase: String,
    /// Whether the cell has been marked.
    pub checked: bool,
    /// Row-major grid position in `0..25`. Absent only on legacy rows.
    pub position: Option<u8>,
}

impl CellEntity {
    /// Fresh, unchecked cell at `position`.
    pub fn new(username: impl Into<String>, phrase: impl Into<String>, position: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            phrase: phrase.into(),
            checked: false,
            position: Some(position),
        }
    }
}
