//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: the authenticated `Session`
//! - `repository`: persistence interface (`SessionRepository`) plus an
//!   in-memory implementation for isolated (non-persistent) sessions
//! - `store`: the injectable `SessionStore` with `establish` / `current` / `clear`
//!
//! # Usage
//!
//! ```ignore
//! use nia_core::session::{Session, SessionStore, MemorySessionRepository};
//! ```

mod model;
mod repository;
mod store;

pub use model::Session;
pub use repository::{MemorySessionRepository, SessionRepository};
pub use store::SessionStore;
