/// Rumfor Market Tracker — Core Domain Types
///
/// Pure data. No behaviour, no transition logic.
/// Wire names are kebab-case to stay compatible with the tracker's JSON API.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownStatus;

// ── Status Domains ─────────────────────────────────────────────────
//
// Application lifecycle and market availability are two distinct status
// domains. The original tracker folded both into one string union and
// papered over the overlap with empty transition lists; here each domain
// gets its own type so the mix-up cannot be expressed.

/// Lifecycle status of a vendor's market application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    /// Every application status, in lifecycle order.
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    /// Wire name of the status (kebab-case).
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under-review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ApplicationStatus::Draft),
            "submitted" => Ok(ApplicationStatus::Submitted),
            "under-review" => Ok(ApplicationStatus::UnderReview),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "withdrawn" => Ok(ApplicationStatus::Withdrawn),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Availability of a market toward prospective vendors.
///
/// Never a valid application status — the types keep the domains apart.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum MarketAvailability {
    Open,
    AcceptingApplications,
    Closed,
}

impl MarketAvailability {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketAvailability::Open => "open",
            MarketAvailability::AcceptingApplications => "accepting-applications",
            MarketAvailability::Closed => "closed",
        }
    }
}

impl fmt::Display for MarketAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketAvailability {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(MarketAvailability::Open),
            "accepting-applications" => Ok(MarketAvailability::AcceptingApplications),
            "closed" => Ok(MarketAvailability::Closed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

// ── Records ────────────────────────────────────────────────────────

/// A vendor's application to a market — the unit the status engine governs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Application {
    pub id: String,
    pub vendor_id: String,
    pub market_id: String,
    pub status: ApplicationStatus,
    /// Vendor-facing notes, editable only before review starts.
    pub notes: String,
    /// Reviewer commentary recorded with a decision.
    pub review_notes: String,
    /// Set when a promoter acts on the application.
    pub reviewed_by: Option<String>,
    pub created_sequence: u64,
    pub updated_sequence: u64,
}

/// Structured, immutable outcome of one applied event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionOutcome {
    pub event_type: String,
    pub application_id: String,
    pub from: Option<ApplicationStatus>,
    pub to: Option<ApplicationStatus>,
    /// True for a self-transition: admitted, recorded, nothing mutated.
    pub no_op: bool,
}

/// Complete tracker state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerState {
    pub applications: BTreeMap<String, Application>,
    pub event_history: Vec<serde_json::Value>,
}
