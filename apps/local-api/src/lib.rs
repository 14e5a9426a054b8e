//! Client-only substitute for the remote resume API: persists resume
//! documents and a single user profile in a local key-value store while
//! preserving the request/response contract the rest of the application
//! expects (status codes, payload shapes, error conditions).

pub mod api;
pub mod config;
pub mod defaults;
pub mod editor;
pub mod errors;
pub mod models;
pub mod repository;
pub mod schema;
pub mod storage;

pub use api::{ApiResponse, LocalApi};
pub use config::Config;
pub use editor::{DebouncedSaver, ResumeEditor, ResumeSink};
pub use errors::AppError;
pub use models::{Document, Resume, User};
pub use repository::Repository;
pub use storage::{DocumentStore, FileStorage, MemoryStorage, StorageBackend};
