use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Review state shared by standard records and payment lines.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReviewState {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
}

/// Batch-wide review actions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
    Withdraw,
}

impl ReviewState {
    /// Transition table for review actions. `None` means the action is not
    /// allowed from this state.
    pub fn apply(self, action: ReviewAction) -> Option<ReviewState> {
        use ReviewAction::*;
        use ReviewState::*;

        match (self, action) {
            (Pending | Approved, Approve) => Some(Approved),
            (Pending, Reject) => Some(Rejected),
            (Pending | Approved | Rejected, Withdraw) => Some(Withdrawn),
            _ => None,
        }
    }

    /// Closed lines may be superseded by a fresh registration.
    pub fn is_closed(self) -> bool {
        matches!(self, ReviewState::Rejected | ReviewState::Withdrawn)
    }
}

impl TryFrom<String> for ReviewState {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
