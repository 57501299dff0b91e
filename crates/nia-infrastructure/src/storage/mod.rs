//! Storage layer for atomic file operations and credentials.

mod atomic_toml;
mod credentials;

pub use atomic_toml::{AtomicTomlError, AtomicTomlFile};
pub use credentials::{GUARDIAN_TOKEN_ENV, GuardianCredentialStorage, GuardianCredentials};
