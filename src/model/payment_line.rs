use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::review_state::ReviewState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PaymentLine {
    pub id: u64,
    pub employee_id: u64,
    pub pay_item_id: u64,
    pub amount: f64,
    /// Always the first day of the month
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub pay_month: NaiveDate,
    #[schema(example = "202401-ORG7")]
    pub batch_id: String,
    pub organization_id: u64,
    pub is_bonus: bool,
    pub is_deduction: bool,
    #[sqlx(try_from = "String")]
    pub review_state: ReviewState,
    #[schema(nullable = true)]
    pub reviewer_id: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub reviewed_at: Option<NaiveDateTime>,
    pub creator_id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentLine {
    pub employee_id: u64,
    pub pay_item_id: u64,
    pub amount: f64,
    pub pay_month: NaiveDate,
    pub batch_id: String,
    pub organization_id: u64,
    pub is_bonus: bool,
    pub is_deduction: bool,
    pub creator_id: u64,
}
