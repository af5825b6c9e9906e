//! engine::status
//!
//! The query / insync half of the scheduler protocol.
//!
//! [`status_for`] reduces an observation to a single reported value and
//! [`insync`] decides whether that value satisfies the desired `ensure`.
//! `needs-update` never satisfies anything, so reporting it guarantees a
//! corrective action runs.

use std::fmt;

use serde::{Serialize, Serializer};

use super::plan::Observation;
use crate::core::types::Ensure;

/// What a query reports for a managed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedStatus {
    Absent,
    Present,
    NeedsUpdate,
    /// The desired revision specifier, echoed back on an exact match
    Revision(String),
}

impl ReportedStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ReportedStatus::Absent => "absent",
            ReportedStatus::Present => "present",
            ReportedStatus::NeedsUpdate => "needs-update",
            ReportedStatus::Revision(spec) => spec,
        }
    }
}

impl fmt::Display for ReportedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReportedStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Report the status of an observed path against the desired `ensure`.
pub fn status_for(ensure: &Ensure, observation: &Observation) -> ReportedStatus {
    if !observation.actual.exists {
        return ReportedStatus::Absent;
    }

    match ensure {
        Ensure::Absent => ReportedStatus::Present,
        Ensure::Present if observation.remote_matches => ReportedStatus::Present,
        Ensure::Present => ReportedStatus::NeedsUpdate,
        Ensure::Revision(spec) => {
            if observation.remote_matches && observation.revision_matches() == Some(true) {
                ReportedStatus::Revision(spec.clone())
            } else {
                ReportedStatus::NeedsUpdate
            }
        }
    }
}

/// Whether `status` satisfies `ensure`.
///
/// `present` satisfies every desired value except `absent`.
pub fn insync(ensure: &Ensure, status: &ReportedStatus) -> bool {
    match status {
        ReportedStatus::NeedsUpdate => false,
        ReportedStatus::Absent => *ensure == Ensure::Absent,
        ReportedStatus::Present => *ensure != Ensure::Absent,
        ReportedStatus::Revision(spec) => {
            matches!(ensure, Ensure::Revision(wanted) if wanted == spec)
        }
    }
}
