//! Monthly payment batches.
//!
//! A batch has no row of its own: it is the set of payment lines sharing a
//! batch id derived from (pay month, organization). Every batch-level read
//! is a group-by over those lines.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::{AppError, AppResult},
    model::{
        employee::Employee,
        pay_item::PayItem,
        payment_line::{NewPaymentLine, PaymentLine},
        review_state::{ReviewAction, ReviewState},
        role::Role,
    },
    service::{
        hierarchy::employees_under,
        org_tree::{descendant_ids, ensure_oversees, get_organization},
        standard::{ResolvedStandard, resolve},
    },
    store::{ReviewStamp, Store},
};

/// Names of the pay items that ad-hoc bonus and deduction lines book
/// against.
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    pub bonus_item_name: String,
    pub deduction_item_name: String,
}

impl LedgerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bonus_item_name: config.bonus_item_name.clone(),
            deduction_item_name: config.deduction_item_name.clone(),
        }
    }
}

pub fn batch_id_for(pay_month: NaiveDate, organization_id: u64) -> String {
    format!("{}-ORG{}", pay_month.format("%Y%m"), organization_id)
}

/// Accepts `YYYY-MM` or a full date; either way the result is the first
/// day of that month.
pub fn parse_pay_month(raw: &str) -> AppResult<NaiveDate> {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d"))
        .map_err(|_| AppError::validation(format!("Invalid pay month: {}", raw)))?;

    first_of_month(date)
}

fn first_of_month(date: NaiveDate) -> AppResult<NaiveDate> {
    date.with_day(1)
        .ok_or_else(|| AppError::validation(format!("Invalid pay month: {}", date)))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EmployeeInput {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = 500.0)]
    pub bonus_amount: Option<f64>,
    #[schema(example = 0.0)]
    pub deduction_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RegisterOutcome {
    #[schema(example = "202401-ORG7")]
    pub batch_id: String,
    pub line_count: u64,
    /// Employees that were unknown or outside the organization
    pub skipped: Vec<u64>,
}

fn check_amount(value: Option<f64>, field: &str, employee_id: u64) -> AppResult<f64> {
    match value {
        None => Ok(0.0),
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(v) => Err(AppError::validation(format!(
            "{} for employee {} must be a non-negative number, got {}",
            field, employee_id, v
        ))),
    }
}

async fn well_known_item<S: Store>(store: &S, name: &str) -> AppResult<PayItem> {
    store
        .pay_item_by_name(name)
        .await?
        .filter(|item| item.active)
        .ok_or_else(|| {
            AppError::ConfigurationMissing(format!("Pay item {} is not configured or inactive", name))
        })
}

#[instrument(
    name = "ledger_register",
    skip(store, settings, caller, inputs),
    fields(caller = caller.user_id)
)]
pub async fn register_batch<S: Store>(
    store: &S,
    settings: &LedgerSettings,
    caller: &AuthUser,
    pay_month: NaiveDate,
    organization_id: u64,
    inputs: Vec<EmployeeInput>,
) -> AppResult<RegisterOutcome> {
    let pay_month = first_of_month(pay_month)?;

    // 1️⃣ Target unit and scope
    let org = get_organization(store, organization_id).await?;
    ensure_oversees(store, caller, &org).await?;

    // 2️⃣ Input validation
    if inputs.is_empty() {
        return Err(AppError::validation("Nothing to register"));
    }
    let mut seen = HashSet::new();
    for input in &inputs {
        if !seen.insert(input.employee_id) {
            return Err(AppError::validation(format!(
                "Employee {} listed more than once",
                input.employee_id
            )));
        }
        check_amount(input.bonus_amount, "Bonus", input.employee_id)?;
        check_amount(input.deduction_amount, "Deduction", input.employee_id)?;
    }

    // 3️⃣ Open batch check, repeated atomically by the store on commit
    let batch_id = batch_id_for(pay_month, org.id);
    let existing = store.batch_lines(&batch_id).await?;
    if existing.iter().any(|l| !l.review_state.is_closed()) {
        return Err(AppError::open_batch(&batch_id));
    }

    // 4️⃣ Well-known and bookable items, before any line is built
    let bonus_item = well_known_item(store, &settings.bonus_item_name).await?;
    let deduction_item = well_known_item(store, &settings.deduction_item_name).await?;
    let bookable: HashSet<u64> = store
        .list_pay_items()
        .await?
        .into_iter()
        .filter(|item| item.active)
        .map(|item| item.id)
        .collect();

    // 5️⃣ Build lines
    let placed: HashMap<u64, Employee> = employees_under(store, &org)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();
    let mut standards: HashMap<u64, ResolvedStandard> = HashMap::new();
    let mut skipped = Vec::new();
    let mut lines = Vec::new();

    let line = |employee_id: u64, pay_item_id: u64, amount: f64| NewPaymentLine {
        employee_id,
        pay_item_id,
        amount,
        pay_month,
        batch_id: batch_id.clone(),
        organization_id: org.id,
        is_bonus: false,
        is_deduction: false,
        creator_id: caller.user_id,
    };

    for input in &inputs {
        let Some(position_id) = placed.get(&input.employee_id).and_then(|e| e.position_id) else {
            warn!(employee_id = input.employee_id, "Employee not placed in organization, skipped");
            skipped.push(input.employee_id);
            continue;
        };

        if !standards.contains_key(&position_id) {
            let resolved = resolve(store, position_id).await?;
            standards.insert(position_id, resolved);
        }
        if let Some(standard) = standards.get(&position_id) {
            for (pay_item_id, amount) in &standard.items {
                if !bookable.contains(pay_item_id) {
                    warn!(position_id, pay_item_id, "Pay item inactive or deleted, not booked");
                    continue;
                }
                lines.push(line(input.employee_id, *pay_item_id, *amount));
            }
        }

        let bonus = check_amount(input.bonus_amount, "Bonus", input.employee_id)?;
        if bonus > 0.0 {
            lines.push(NewPaymentLine {
                is_bonus: true,
                ..line(input.employee_id, bonus_item.id, bonus)
            });
        }

        let deduction = check_amount(input.deduction_amount, "Deduction", input.employee_id)?;
        if deduction > 0.0 {
            lines.push(NewPaymentLine {
                is_deduction: true,
                ..line(input.employee_id, deduction_item.id, deduction)
            });
        }
    }

    if lines.is_empty() {
        return Err(AppError::validation("Nothing to register"));
    }

    // 6️⃣ Single atomic write
    let line_count = store.commit_batch(&batch_id, lines).await?;

    info!(%batch_id, line_count, skipped = skipped.len(), "Batch registered");

    Ok(RegisterOutcome {
        batch_id,
        line_count,
        skipped,
    })
}

/// Status of a batch is the state of its first line; all lines of a batch
/// move together.
fn batch_status(lines: &[PaymentLine]) -> Option<ReviewState> {
    lines.first().map(|l| l.review_state)
}

async fn transition<S: Store>(
    store: &S,
    lines: &[PaymentLine],
    batch_id: &str,
    action: ReviewAction,
    stamp: ReviewStamp,
) -> AppResult<ReviewState> {
    let current = batch_status(lines)
        .ok_or_else(|| AppError::not_found(format!("Batch {} not found", batch_id)))?;

    let next = current.apply(action).ok_or_else(|| {
        AppError::conflict(format!(
            "Cannot {} batch {} in state {}",
            action, batch_id, current
        ))
    })?;

    let line_ids: Vec<u64> = lines.iter().map(|l| l.id).collect();
    let affected = store
        .mark_batch(batch_id, &line_ids, current, next, stamp)
        .await?;
    info!(batch_id, from = %current, to = %next, affected, "Batch transitioned");
    Ok(next)
}

async fn load_batch<S: Store>(store: &S, batch_id: &str) -> AppResult<Vec<PaymentLine>> {
    let lines = store.batch_lines(batch_id).await?;
    if lines.is_empty() {
        return Err(AppError::not_found(format!("Batch {} not found", batch_id)));
    }
    Ok(lines)
}

async fn ensure_oversees_batch<S: Store>(
    store: &S,
    caller: &AuthUser,
    lines: &[PaymentLine],
) -> AppResult<()> {
    if caller.is_admin() {
        return Ok(());
    }
    let Some(first) = lines.first() else {
        return Ok(());
    };
    let org = get_organization(store, first.organization_id).await?;
    ensure_oversees(store, caller, &org).await
}

/// Approves or rejects the whole batch. Approving twice re-stamps.
pub async fn review_batch<S: Store>(
    store: &S,
    caller: &AuthUser,
    batch_id: &str,
    approve: bool,
) -> AppResult<ReviewState> {
    caller.require_admin()?;

    let lines = load_batch(store, batch_id).await?;
    let action = if approve {
        ReviewAction::Approve
    } else {
        ReviewAction::Reject
    };
    let stamp = ReviewStamp::by(caller.user_id, Utc::now().naive_utc());

    transition(store, &lines, batch_id, action, stamp).await
}

pub async fn withdraw_batch<S: Store>(
    store: &S,
    caller: &AuthUser,
    batch_id: &str,
) -> AppResult<ReviewState> {
    let lines = load_batch(store, batch_id).await?;
    ensure_oversees_batch(store, caller, &lines).await?;

    transition(
        store,
        &lines,
        batch_id,
        ReviewAction::Withdraw,
        ReviewStamp::cleared(),
    )
    .await
}

// ---------- reporting ----------

/// Signed contribution of a line: deductions count against the total.
fn signed(line: &PaymentLine) -> f64 {
    if line.is_deduction {
        -line.amount
    } else {
        line.amount
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BatchSummary {
    pub batch_id: String,
    #[schema(value_type = String, format = "date")]
    pub pay_month: NaiveDate,
    pub organization_id: u64,
    pub status: ReviewState,
    /// Net of deductions
    pub total_amount: f64,
    pub employee_count: usize,
    pub line_count: usize,
}

impl BatchSummary {
    fn from_lines(batch_id: String, lines: &[PaymentLine]) -> Option<Self> {
        let first = lines.first()?;
        let employees: HashSet<u64> = lines.iter().map(|l| l.employee_id).collect();

        Some(Self {
            batch_id,
            pay_month: first.pay_month,
            organization_id: first.organization_id,
            status: first.review_state,
            total_amount: lines.iter().map(signed).sum(),
            employee_count: employees.len(),
            line_count: lines.len(),
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchPage {
    pub data: Vec<BatchSummary>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

/// Batches visible to the caller, newest pay month first.
pub async fn list_batches<S: Store>(
    store: &S,
    caller: &AuthUser,
    page: u32,
    per_page: u32,
) -> AppResult<BatchPage> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, 100);
    let offset = u64::from(page - 1) * u64::from(per_page);

    let scope = match (caller.role, caller.managed_organization) {
        (Role::Admin, _) => None,
        (Role::Boss, Some(managed)) => {
            let org = get_organization(store, managed).await?;
            Some(descendant_ids(store, &org).await?)
        }
        _ => return Err(AppError::denied("Only admins and managers can list batches")),
    };

    let (batch_ids, total) = store
        .batch_page(scope.as_deref(), offset, u64::from(per_page))
        .await?;

    let mut data = Vec::with_capacity(batch_ids.len());
    for batch_id in batch_ids {
        let lines = store.batch_lines(&batch_id).await?;
        if let Some(summary) = BatchSummary::from_lines(batch_id, &lines) {
            data.push(summary);
        }
    }

    Ok(BatchPage {
        data,
        page,
        per_page,
        total,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmployeePay {
    pub employee_id: u64,
    #[schema(nullable = true)]
    pub employee_name: Option<String>,
    /// Standard lines by pay item id
    pub items: BTreeMap<u64, f64>,
    pub base: f64,
    pub bonus: f64,
    pub deduction: f64,
    /// base + bonus - deduction
    pub actual: f64,
}

impl EmployeePay {
    fn new(employee_id: u64) -> Self {
        Self {
            employee_id,
            employee_name: None,
            items: BTreeMap::new(),
            base: 0.0,
            bonus: 0.0,
            deduction: 0.0,
            actual: 0.0,
        }
    }

    fn add(&mut self, line: &PaymentLine) {
        if line.is_bonus {
            self.bonus += line.amount;
        } else if line.is_deduction {
            self.deduction += line.amount;
        } else {
            self.base += line.amount;
            *self.items.entry(line.pay_item_id).or_default() += line.amount;
        }
        self.actual = self.base + self.bonus - self.deduction;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BatchDetail {
    pub batch_id: String,
    #[schema(value_type = String, format = "date")]
    pub pay_month: NaiveDate,
    pub organization_id: u64,
    pub status: ReviewState,
    pub employees: Vec<EmployeePay>,
    pub total_base: f64,
    pub total_bonus: f64,
    pub total_deduction: f64,
    pub total_actual: f64,
}

/// Per-employee breakdown of a batch.
pub async fn batch_detail<S: Store>(
    store: &S,
    caller: &AuthUser,
    batch_id: &str,
) -> AppResult<BatchDetail> {
    let lines = load_batch(store, batch_id).await?;
    ensure_oversees_batch(store, caller, &lines).await?;

    let mut by_employee: BTreeMap<u64, EmployeePay> = BTreeMap::new();
    for line in &lines {
        by_employee
            .entry(line.employee_id)
            .or_insert_with(|| EmployeePay::new(line.employee_id))
            .add(line);
    }

    let mut employees = Vec::with_capacity(by_employee.len());
    for (employee_id, mut pay) in by_employee {
        pay.employee_name = store.get_employee(employee_id).await?.map(|e| e.full_name());
        employees.push(pay);
    }

    let summary = BatchSummary::from_lines(batch_id.to_string(), &lines)
        .ok_or_else(|| AppError::not_found(format!("Batch {} not found", batch_id)))?;

    Ok(BatchDetail {
        total_base: employees.iter().map(|e| e.base).sum(),
        total_bonus: employees.iter().map(|e| e.bonus).sum(),
        total_deduction: employees.iter().map(|e| e.deduction).sum(),
        total_actual: employees.iter().map(|e| e.actual).sum(),
        batch_id: summary.batch_id,
        pay_month: summary.pay_month,
        organization_id: summary.organization_id,
        status: summary.status,
        employees,
    })
}
