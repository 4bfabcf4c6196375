/// Board, user and phrase persistence.
pub mod board_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
