//! Application layer for Nia.
//!
//! Wires the core session lifecycle to its HTTP collaborators and local
//! storage, and exposes the flows a front end drives: sign in, chat, sign out.

pub mod bootstrap;
pub mod child_session_usecase;

pub use bootstrap::AppBootstrap;
pub use child_session_usecase::{ChatSession, ChildSessionUseCase, LoginScreen};
