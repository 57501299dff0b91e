//! Child identity domain module.
//!
//! - `model`: the immutable `ChildIdentity` record and its `ChildId`
//! - `directory`: the read-only Identity Store interface (`IdentityDirectory`)

mod directory;
mod model;

pub use directory::{IdentityDirectory, InMemoryIdentityDirectory};
pub use model::{ChildId, ChildIdentity};
