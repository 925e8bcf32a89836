// AutoYard client library: listing search and details, filter normalization,
// per-user search history and negotiation stores, and the asset server router

pub mod autoyard_api;
pub mod config;
pub mod error;
pub mod filters;
pub mod formatters;
pub mod history;
pub mod market;
pub mod models;
pub mod negotiations;
pub mod routes;
pub mod storage;

pub use autoyard_api::{AutoyardClient, SearchPage};
pub use error::{ApiError, FailureKind, StorageError};
pub use history::SearchHistory;
pub use negotiations::Negotiations;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
