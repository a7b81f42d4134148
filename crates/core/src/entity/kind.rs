use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::storage::KeyError;

/// Every kind of entity stored in the table.
///
/// The variant name is the sort key prefix, so names must never contain the
/// key delimiter and no name may be confused with another once the delimiter
/// is appended (`Submission#` vs `SubmissionRank#`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Festival,
    Fort,
    Submission,
    Label,
    Vote,
    SubmissionRank,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Festival,
        EntityKind::Fort,
        EntityKind::Submission,
        EntityKind::Label,
        EntityKind::Vote,
        EntityKind::SubmissionRank,
    ];

    /// Returns the type name used in sort keys.
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Festival => "Festival",
            EntityKind::Fort => "Fort",
            EntityKind::Submission => "Submission",
            EntityKind::Label => "Label",
            EntityKind::Vote => "Vote",
            EntityKind::SubmissionRank => "SubmissionRank",
        }
    }

    /// Returns the sort key prefix, delimiter included.
    pub fn sort_key_prefix(&self) -> &'static str {
        match self {
            EntityKind::Festival => "Festival#",
            EntityKind::Fort => "Fort#",
            EntityKind::Submission => "Submission#",
            EntityKind::Label => "Label#",
            EntityKind::Vote => "Vote#",
            EntityKind::SubmissionRank => "SubmissionRank#",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| KeyError::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KEY_DELIMITER;

    #[test]
    fn test_prefix_is_name_plus_delimiter() {
        for kind in EntityKind::ALL {
            assert_eq!(
                kind.sort_key_prefix(),
                format!("{}{}", kind.name(), KEY_DELIMITER)
            );
        }
    }

    #[test]
    fn test_names_do_not_contain_delimiter() {
        for kind in EntityKind::ALL {
            assert!(!kind.name().contains(KEY_DELIMITER));
        }
    }

    #[test]
    fn test_no_prefix_matches_another_kind() {
        for a in EntityKind::ALL {
            for b in EntityKind::ALL {
                if a != b {
                    assert!(
                        !b.sort_key_prefix().starts_with(a.sort_key_prefix()),
                        "{a} prefix matches {b}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Vote".parse::<EntityKind>(), Ok(EntityKind::Vote));
        assert_eq!(
            "SubmissionRank".parse::<EntityKind>(),
            Ok(EntityKind::SubmissionRank)
        );
        assert_eq!(
            "vote".parse::<EntityKind>(),
            Err(KeyError::UnknownKind("vote".to_string()))
        );
    }
}
