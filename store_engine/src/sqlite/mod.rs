//! SQLite backend for the store engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
