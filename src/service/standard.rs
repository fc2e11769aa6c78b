//! Collapses the versioned standard records of a position into one
//! effective standard.
//!
//! Records are never edited. A new submission inserts `pending` rows; the
//! latest approved record per pay item wins.

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::{
        position::Position,
        review_state::ReviewState,
        standard::{NewStandardRecord, StandardRecord},
    },
    store::{ReviewStamp, Store},
};

/// Effective standard of a position, keyed by pay item id.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ResolvedStandard {
    pub position_id: u64,
    pub items: BTreeMap<u64, f64>,
    /// Base compensation: the sum of `items`
    pub total: f64,
    /// False while any item's latest record is still unreviewed or rejected
    pub fully_approved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StandardEntry {
    pub pay_item_id: u64,
    pub amount: f64,
    #[schema(value_type = String, format = "date")]
    pub effective_date: NaiveDate,
    pub review_state: ReviewState,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StandardStatus {
    pub position_id: u64,
    /// Absent when the position has no standard yet
    #[schema(nullable = true)]
    pub overall: Option<ReviewState>,
    pub items: Vec<StandardEntry>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StandardItemInput {
    #[schema(example = 1)]
    pub pay_item_id: u64,
    #[schema(example = 8000.0)]
    pub amount: f64,
}

/// First record per pay item. Input must be ordered newest first.
fn latest_per_item<'a>(records: impl IntoIterator<Item = &'a StandardRecord>) -> Vec<&'a StandardRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.pay_item_id))
        .collect()
}

async fn require_position<S: Store>(store: &S, position_id: u64) -> AppResult<Position> {
    store
        .get_position(position_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Position {} not found", position_id)))
}

pub async fn resolve<S: Store>(store: &S, position_id: u64) -> AppResult<ResolvedStandard> {
    require_position(store, position_id).await?;

    let approved = store.standard_records(position_id, true).await?;
    let items: BTreeMap<u64, f64> = latest_per_item(&approved)
        .into_iter()
        .map(|r| (r.pay_item_id, r.amount))
        .collect();
    let total = items.values().sum();

    let fully_approved = status(store, position_id)
        .await?
        .items
        .iter()
        .all(|e| e.review_state == ReviewState::Approved);

    debug!(position_id, items = items.len(), total, fully_approved, "Standard resolved");

    Ok(ResolvedStandard {
        position_id,
        items,
        total,
        fully_approved,
    })
}

/// Unfiltered per-item view: the latest non-withdrawn record for each pay
/// item, whatever its review state.
pub async fn status<S: Store>(store: &S, position_id: u64) -> AppResult<StandardStatus> {
    require_position(store, position_id).await?;

    let records = store.standard_records(position_id, false).await?;
    let live = records
        .iter()
        .filter(|r| r.review_state != ReviewState::Withdrawn);

    let items: Vec<StandardEntry> = latest_per_item(live)
        .into_iter()
        .map(|r| StandardEntry {
            pay_item_id: r.pay_item_id,
            amount: r.amount,
            effective_date: r.effective_date,
            review_state: r.review_state,
        })
        .collect();

    let overall = if items.is_empty() {
        None
    } else if items.iter().all(|e| e.review_state == ReviewState::Approved) {
        Some(ReviewState::Approved)
    } else {
        Some(ReviewState::Rejected)
    };

    Ok(StandardStatus {
        position_id,
        overall,
        items,
    })
}

/// Inserts a new pending version of the position's standard. Non-positive
/// amounts are dropped here, never at resolution time.
pub async fn submit<S: Store>(
    store: &S,
    caller: &AuthUser,
    position_id: u64,
    effective_date: NaiveDate,
    items: Vec<StandardItemInput>,
) -> AppResult<usize> {
    caller.require_admin()?;
    require_position(store, position_id).await?;

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(items.len());

    for item in items {
        if !seen.insert(item.pay_item_id) {
            return Err(AppError::validation(format!(
                "Pay item {} listed more than once",
                item.pay_item_id
            )));
        }
        if !item.amount.is_finite() {
            return Err(AppError::validation("Amount must be a number"));
        }

        let pay_item = store
            .get_pay_item(item.pay_item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Pay item {} not found", item.pay_item_id)))?;
        if !pay_item.active {
            return Err(AppError::validation(format!(
                "Pay item {} is inactive",
                pay_item.name
            )));
        }

        if item.amount <= 0.0 {
            debug!(position_id, pay_item_id = item.pay_item_id, "Skipping non-positive amount");
            continue;
        }

        records.push(NewStandardRecord {
            position_id,
            pay_item_id: item.pay_item_id,
            amount: item.amount,
            effective_date,
            creator_id: caller.user_id,
        });
    }

    if records.is_empty() {
        return Err(AppError::validation("Nothing to register"));
    }

    let count = records.len();
    store.insert_standard_records(records).await?;

    info!(position_id, %effective_date, count, "Standard submitted");
    Ok(count)
}

/// Approves or rejects every pending record of the position.
pub async fn review<S: Store>(
    store: &S,
    caller: &AuthUser,
    position_id: u64,
    approve: bool,
) -> AppResult<u64> {
    caller.require_admin()?;
    require_position(store, position_id).await?;

    let to = if approve {
        ReviewState::Approved
    } else {
        ReviewState::Rejected
    };
    let stamp = ReviewStamp::by(caller.user_id, Utc::now().naive_utc());

    let affected = store
        .mark_standard_records(position_id, ReviewState::Pending, to, stamp)
        .await?;
    if affected == 0 {
        return Err(AppError::not_found(format!(
            "No pending standard for position {}",
            position_id
        )));
    }

    info!(position_id, state = %to, affected, "Standard reviewed");
    Ok(affected)
}

/// Withdraws the position's pending submission.
pub async fn withdraw<S: Store>(store: &S, caller: &AuthUser, position_id: u64) -> AppResult<u64> {
    caller.require_admin()?;
    require_position(store, position_id).await?;

    let affected = store
        .mark_standard_records(
            position_id,
            ReviewState::Pending,
            ReviewState::Withdrawn,
            ReviewStamp::cleared(),
        )
        .await?;
    if affected == 0 {
        return Err(AppError::not_found(format!(
            "No pending standard for position {}",
            position_id
        )));
    }

    info!(position_id, affected, "Standard withdrawn");
    Ok(affected)
}
