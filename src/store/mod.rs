//! Document store seam.
//!
//! The ledger core only talks to persistence through [`Store`]. Every read
//! skips soft-deleted rows and every delete is a flag update, so historical
//! standard records and payment lines are never physically removed.

use chrono::NaiveDateTime;

use crate::{
    error::AppResult,
    model::{
        employee::Employee,
        organization::{NewOrganization, Organization},
        pay_item::PayItem,
        payment_line::{NewPaymentLine, PaymentLine},
        position::{NewPosition, Position},
        review_state::ReviewState,
        standard::{NewStandardRecord, StandardRecord},
    },
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

/// Review stamp written by bulk review updates. `None` clears the stamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewStamp {
    pub reviewer_id: Option<u64>,
    pub reviewed_at: Option<NaiveDateTime>,
}

impl ReviewStamp {
    pub fn cleared() -> Self {
        Self {
            reviewer_id: None,
            reviewed_at: None,
        }
    }

    pub fn by(reviewer_id: u64, at: NaiveDateTime) -> Self {
        Self {
            reviewer_id: Some(reviewer_id),
            reviewed_at: Some(at),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Store {
    // ---------- organizations ----------
    async fn insert_organization(&self, org: NewOrganization) -> AppResult<u64>;
    async fn get_organization(&self, id: u64) -> AppResult<Option<Organization>>;
    /// Ordered by level, then id.
    async fn list_organizations(&self) -> AppResult<Vec<Organization>>;
    async fn child_organizations(&self, parent_ids: &[u64]) -> AppResult<Vec<Organization>>;
    async fn set_organization_manager(&self, id: u64, manager_id: Option<u64>) -> AppResult<bool>;
    async fn organization_managed_by(&self, employee_id: u64) -> AppResult<Option<Organization>>;
    async fn managed_organizations(&self) -> AppResult<Vec<Organization>>;
    async fn soft_delete_organization(&self, id: u64) -> AppResult<bool>;

    // ---------- positions ----------
    /// Fails with `Conflict` when the name is taken inside the organization.
    async fn insert_position(&self, position: NewPosition) -> AppResult<u64>;
    async fn get_position(&self, id: u64) -> AppResult<Option<Position>>;
    async fn positions_in(&self, organization_ids: &[u64]) -> AppResult<Vec<Position>>;
    async fn soft_delete_position(&self, id: u64) -> AppResult<bool>;

    // ---------- pay items ----------
    /// Fails with `Conflict` when the name is taken.
    async fn insert_pay_item(&self, name: &str) -> AppResult<u64>;
    async fn get_pay_item(&self, id: u64) -> AppResult<Option<PayItem>>;
    async fn pay_item_by_name(&self, name: &str) -> AppResult<Option<PayItem>>;
    async fn list_pay_items(&self) -> AppResult<Vec<PayItem>>;
    async fn set_pay_item_active(&self, id: u64, active: bool) -> AppResult<bool>;
    async fn soft_delete_pay_item(&self, id: u64) -> AppResult<bool>;

    // ---------- employees ----------
    async fn get_employee(&self, id: u64) -> AppResult<Option<Employee>>;
    async fn employees_in_positions(&self, position_ids: &[u64]) -> AppResult<Vec<Employee>>;

    // ---------- standard records ----------
    async fn insert_standard_records(&self, records: Vec<NewStandardRecord>) -> AppResult<()>;
    /// Newest effective date first; ties broken by newest id.
    async fn standard_records(
        &self,
        position_id: u64,
        approved_only: bool,
    ) -> AppResult<Vec<StandardRecord>>;
    /// Bulk-marks every record of the position currently in `from`.
    async fn mark_standard_records(
        &self,
        position_id: u64,
        from: ReviewState,
        to: ReviewState,
        stamp: ReviewStamp,
    ) -> AppResult<u64>;

    // ---------- payment lines ----------
    async fn batch_lines(&self, batch_id: &str) -> AppResult<Vec<PaymentLine>>;
    /// Atomically: fail with `Conflict` if the batch has any open line,
    /// otherwise soft-delete the closed lines and insert `lines`.
    async fn commit_batch(&self, batch_id: &str, lines: Vec<NewPaymentLine>) -> AppResult<u64>;
    /// Moves the given lines of a batch from `from` to `to` in one step.
    /// Fails with `Conflict` and changes nothing unless every line is still
    /// live and in `from`.
    async fn mark_batch(
        &self,
        batch_id: &str,
        line_ids: &[u64],
        from: ReviewState,
        to: ReviewState,
        stamp: ReviewStamp,
    ) -> AppResult<u64>;
    /// Distinct batch ids, newest pay month first, optionally restricted to
    /// a set of organizations. Returns the page and the total batch count.
    async fn batch_page(
        &self,
        organization_ids: Option<&[u64]>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<String>, u64)>;
}
