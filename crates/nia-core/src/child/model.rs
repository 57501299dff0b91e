//! Child identity model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a child profile within a household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChildId(pub u64);

impl fmt::Display for ChildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChildId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A child profile as supplied by the Identity Store.
///
/// Immutable once loaded. The PIN entry machine and the Session Store hold
/// clones of it; nothing in this workspace edits an identity in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildIdentity {
    /// Household-unique identifier
    pub id: ChildId,
    /// Nickname if set, otherwise first name
    pub display_name: String,
    /// Grade label as configured by the guardian (e.g. "3rd")
    pub grade_level: String,
}

impl ChildIdentity {
    pub fn new(
        id: impl Into<ChildId>,
        display_name: impl Into<String>,
        grade_level: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            grade_level: grade_level.into(),
        }
    }

    /// First letter of the display name, used for avatar badges.
    pub fn initial(&self) -> Option<char> {
        self.display_name
            .trim()
            .chars()
            .next()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial() {
        assert_eq!(ChildIdentity::new(1, "ava", "2nd").initial(), Some('A'));
        assert_eq!(ChildIdentity::new(2, "  Leo", "K").initial(), Some('L'));
        assert_eq!(ChildIdentity::new(3, "", "K").initial(), None);
    }

    #[test]
    fn test_child_id_serializes_as_number() {
        let child = ChildIdentity::new(7, "Mia", "4th");
        let json = serde_json::to_value(&child).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["display_name"], "Mia");
    }
}
