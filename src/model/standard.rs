use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::review_state::ReviewState;

/// One versioned amount for a (position, pay item) pair. Never updated in
/// place; newer records supersede older ones by effective date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct StandardRecord {
    pub id: u64,
    pub position_id: u64,
    pub pay_item_id: u64,
    pub amount: f64,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub effective_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub review_state: ReviewState,
    #[schema(nullable = true)]
    pub reviewer_id: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub reviewed_at: Option<NaiveDateTime>,
    pub creator_id: u64,
}

#[derive(Debug, Clone)]
pub struct NewStandardRecord {
    pub position_id: u64,
    pub pay_item_id: u64,
    pub amount: f64,
    pub effective_date: NaiveDate,
    pub creator_id: u64,
}
