//! User database and downloaded-asset references

pub mod assets;
pub mod db;

// Re-exports for convenience
pub use assets::{AssetStore, ClaimedAsset};
pub use db::{create_pool, get_connection, DbConnection, DbPool};
