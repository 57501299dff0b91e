//! Identity Store interface.

use super::model::ChildIdentity;
use crate::error::Result;
use async_trait::async_trait;

/// Read-only source of the child profiles of the current household.
///
/// An empty list is a valid answer: it means no profile has been set up yet,
/// which callers render as a terminal "ask your parent" screen.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Lists all child profiles available for sign-in.
    async fn list_children(&self) -> Result<Vec<ChildIdentity>>;
}

/// Directory backed by a fixed list, for single-household setups and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityDirectory {
    children: Vec<ChildIdentity>,
}

impl InMemoryIdentityDirectory {
    pub fn new(children: Vec<ChildIdentity>) -> Self {
        Self { children }
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn list_children(&self) -> Result<Vec<ChildIdentity>> {
        Ok(self.children.clone())
    }
}
