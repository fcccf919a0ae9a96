//! The roster of expected annotators.
//!
//! Support for a segment is only ever looked up against roster members. An
//! annotator outside the roster still has its own segments classified, but is
//! never counted as support for anyone else.

use serde::Serialize;
use thiserror::Error;

use crate::types::{AnnotatorId, ValidationError};

/// Annotator IDs used when no roster is configured.
pub const DEFAULT_ROSTER: [&str; 3] = ["1", "2", "3"];

/// Errors building a roster.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("roster must name at least one annotator")]
    Empty,
    #[error(transparent)]
    InvalidId(#[from] ValidationError),
}

/// Ordered, de-duplicated set of expected annotator IDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    members: Vec<AnnotatorId>,
}

impl Default for Roster {
    /// The three-annotator roster `1`, `2`, `3`.
    fn default() -> Self {
        Self::new(DEFAULT_ROSTER).expect("default roster ids are non-empty")
    }
}

impl Roster {
    /// Builds a roster from configured IDs, trimming whitespace and
    /// dropping duplicates while keeping first-seen order.
    pub fn new<I, S>(ids: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut members: Vec<AnnotatorId> = Vec::new();
        for id in ids {
            let id = AnnotatorId::new(id.as_ref().trim())?;
            if !members.contains(&id) {
                members.push(id);
            }
        }
        if members.is_empty() {
            return Err(RosterError::Empty);
        }
        Ok(Self { members })
    }

    /// Roster members other than `owner`.
    ///
    /// Returns every member when `owner` is not rostered.
    pub fn others<'a>(&'a self, owner: &'a AnnotatorId) -> impl Iterator<Item = &'a AnnotatorId> {
        self.members.iter().filter(move |id| *id != owner)
    }

    pub fn contains(&self, id: &AnnotatorId) -> bool {
        self.members.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnnotatorId> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AnnotatorId {
        AnnotatorId::new(s).unwrap()
    }

    #[test]
    fn default_roster_is_one_two_three() {
        let roster = Roster::default();
        let ids: Vec<&str> = roster.iter().map(AnnotatorId::as_str).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn others_excludes_owner() {
        let roster = Roster::default();
        let owner = id("2");
        let others: Vec<&str> = roster.others(&owner).map(AnnotatorId::as_str).collect();
        assert_eq!(others, ["1", "3"]);
    }

    #[test]
    fn others_of_unrostered_owner_is_everyone() {
        let roster = Roster::default();
        let owner = id("9");
        assert_eq!(roster.others(&owner).count(), 3);
        assert!(!roster.contains(&owner));
    }

    #[test]
    fn new_trims_and_dedups() {
        let roster = Roster::new(["a", " b ", "a"]).unwrap();
        assert_eq!(roster.len(), 2);
        assert!(roster.contains(&id("b")));
    }

    #[test]
    fn new_rejects_empty() {
        assert_eq!(Roster::new(Vec::<String>::new()), Err(RosterError::Empty));
        assert!(matches!(
            Roster::new([" "]),
            Err(RosterError::InvalidId(_))
        ));
    }
}
