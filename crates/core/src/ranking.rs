//! Vote ranking math and the pure half of the vote tally.
//!
//! [`plan_tally`] turns a drained table scan into the set of
//! [`SubmissionRank`] records to write. The shell crate owns the scan loop
//! and the writes; nothing here touches storage.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::entity::{Entity, EntityKind, EntityMeta, Record, SubmissionRank, Vote};

/// Identity recorded as `created_by` on ranks the tally creates.
pub const AGGREGATOR_IDENTITY: &str = "system:vote-aggregator";

/// An average score with exactly two decimal places, held in hundredths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(i64);

impl Rank {
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    pub const fn hundredths(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid rank {0:?}: expected a decimal with at most two fraction digits")]
pub struct RankParseError(String);

impl FromStr for Rank {
    type Err = RankParseError;

    /// Accepts `5`, `5.5` and `5.50`. Stores may normalize trailing zeros
    /// away, so all three forms must read back as the same rank.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || RankParseError(s.to_string());
        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) || fraction.len() > 2
        {
            return Err(err());
        }
        if unsigned.ends_with('.') {
            return Err(err());
        }

        let whole: i64 = whole.parse().map_err(|_| err())?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| err())? * 10,
            _ => fraction.parse().map_err(|_| err())?,
        };
        let hundredths = whole
            .checked_mul(100)
            .and_then(|h| h.checked_add(fraction))
            .ok_or_else(err)?;
        Ok(Rank(if negative { -hundredths } else { hundredths }))
    }
}

/// Mean of `values` rounded to two decimals, ties to even.
///
/// Computed exactly in integers so midpoints such as 0.125 never drift
/// through binary floating point. Returns `None` for an empty slice.
///
/// ```
/// use submit_core::ranking::{compute_rank, Rank};
///
/// assert_eq!(compute_rank(&[4, 5, 6]), Some(Rank::from_hundredths(500)));
/// assert_eq!(compute_rank(&[1, 0, 0, 0, 0, 0, 0, 0]), Some(Rank::from_hundredths(12)));
/// assert_eq!(compute_rank(&[]), None);
/// ```
pub fn compute_rank(values: &[i64]) -> Option<Rank> {
    if values.is_empty() {
        return None;
    }
    let count = values.len() as i128;
    let sum: i128 = values.iter().map(|&v| v as i128).sum();

    let scaled = sum * 100;
    let quotient = scaled.div_euclid(count);
    let twice_remainder = scaled.rem_euclid(count) * 2;

    let rounded = if twice_remainder > count || (twice_remainder == count && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    };
    i64::try_from(rounded).ok().map(Rank)
}

/// What a tally run should write, derived from one full scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TallyPlan {
    /// One rank per submission that has votes, ordered by submission id.
    pub ranks: Vec<SubmissionRank>,
    /// Vote partitions with no matching submission.
    pub orphaned: Vec<String>,
    /// Vote partitions whose id matched more than one submission record.
    pub conflicting: Vec<String>,
    /// Vote records that failed to decode.
    pub malformed_votes: usize,
}

/// Groups the scanned votes per submission and computes each rank.
///
/// An existing rank keeps its entity id and creation time so the identity
/// index continues to point at the same record; a new rank is stamped with
/// `now` and [`AGGREGATOR_IDENTITY`].
pub fn plan_tally(records: &[Record], now: DateTime<Utc>) -> TallyPlan {
    let mut plan = TallyPlan::default();
    let mut votes: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    let mut submissions: HashMap<&str, usize> = HashMap::new();
    let mut existing: HashMap<&str, EntityMeta> = HashMap::new();

    for record in records {
        if record.is_kind(EntityKind::Vote) {
            match Vote::from_record(record) {
                Ok(vote) => votes
                    .entry(record.partition_key.as_str())
                    .or_default()
                    .push(vote.value),
                Err(_) => plan.malformed_votes += 1,
            }
        } else if record.is_kind(EntityKind::SubmissionRank) {
            if let Ok(rank) = SubmissionRank::from_record(record) {
                existing.insert(record.partition_key.as_str(), rank.meta);
            }
        } else if record.is_kind(EntityKind::Submission) {
            // Matched by prefix only, so a submission with a bad body still
            // anchors its votes.
            *submissions.entry(record.entity_id.as_str()).or_default() += 1;
        }
    }

    for (submission_id, values) in votes {
        match submissions.get(submission_id).copied().unwrap_or(0) {
            0 => {
                plan.orphaned.push(submission_id.to_string());
                continue;
            }
            1 => {}
            _ => {
                plan.conflicting.push(submission_id.to_string());
                continue;
            }
        }

        let Some(rank) = compute_rank(&values) else {
            continue;
        };
        let meta = existing
            .remove(submission_id)
            .unwrap_or_else(|| EntityMeta::at(AGGREGATOR_IDENTITY, now));
        plan.ranks.push(SubmissionRank {
            meta,
            submission_id: submission_id.to_string(),
            rank,
            vote_count: u32::try_from(values.len()).unwrap_or(u32::MAX),
        });
    }

    plan
}
