//! ConsistencyVerifier: compares store counts with the upstream total.

use std::fmt;

use tracing::{info, warn};

/// Row counts observed around one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub before: u64,
    pub after: u64,
    pub api_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Consistent,
    /// Informational only: the rows that were fetched have been written.
    Drift { after: u64, api_count: u64 },
}

impl Verdict {
    pub fn is_consistent(&self) -> bool {
        matches!(self, Verdict::Consistent)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Consistent => write!(f, "OK: counts match, sync complete"),
            Verdict::Drift { after, api_count } => write!(
                f,
                "WARNING: count mismatch (store {after}, upstream {api_count}); investigate missing or extra rows"
            ),
        }
    }
}

pub fn verify(counts: Counts) -> Verdict {
    if counts.after == counts.api_count {
        info!(
            before = counts.before,
            after = counts.after,
            api_count = counts.api_count,
            "[VERIFY] Store matches upstream total"
        );
        Verdict::Consistent
    } else {
        warn!(
            before = counts.before,
            after = counts.after,
            api_count = counts.api_count,
            "[VERIFY] Store count drifted from upstream total"
        );
        Verdict::Drift {
            after: counts.after,
            api_count: counts.api_count,
        }
    }
}
