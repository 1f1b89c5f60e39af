use std::fmt;

use serde::{Deserialize, Serialize};

/// What a cache does when refreshing an expired entry fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Return the fetch error. The expired entry stays stored but is never
    /// served.
    #[default]
    Propagate,
    /// Serve the last successfully fetched set, however old, and retry on
    /// the next call. Fails only when nothing was ever fetched.
    ServeStale,
}

impl fmt::Display for StalePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Propagate => "propagate",
            Self::ServeStale => "serve-stale",
        })
    }
}
