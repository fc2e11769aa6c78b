//! In-process store backing the unit and scenario tests.

use std::sync::{Mutex, MutexGuard};

use super::{ReviewStamp, Store};
use crate::{
    error::{AppError, AppResult},
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

struct Row<T> {
    value: T,
    deleted: bool,
}

impl<T> Row<T> {
    fn live(value: T) -> Self {
        Self {
            value,
            deleted: false,
        }
    }
}

#[derive(Default)]
struct Tables {
    next_id: u64,
    organizations: Vec<Row<Organization>>,
    positions: Vec<Row<Position>>,
    pay_items: Vec<Row<PayItem>>,
    employees: Vec<Row<Employee>>,
    standards: Vec<Row<StandardRecord>>,
    lines: Vec<Row<PaymentLine>>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn live<T>(rows: &[Row<T>]) -> impl Iterator<Item = &T> {
    rows.iter().filter(|r| !r.deleted).map(|r| &r.value)
}

fn live_mut<T>(rows: &mut [Row<T>]) -> impl Iterator<Item = &mut T> {
    rows.iter_mut().filter(|r| !r.deleted).map(|r| &mut r.value)
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }

    /// Employees are owned by the identity side of the system; tests seed
    /// them directly.
    pub fn add_employee(&self, first_name: &str, position_id: Option<u64>) -> u64 {
        let mut t = self.tables();
        let id = t.next_id();
        t.employees.push(Row::live(Employee {
            id,
            employee_code: format!("EMP-{:03}", id),
            first_name: first_name.to_string(),
            last_name: String::new(),
            phone: Some(format!("555-{:04}", id)),
            position_id,
        }));
        id
    }

    /// Rewrites a parent link without any validation.
    pub fn corrupt_parent(&self, id: u64, parent_id: u64) {
        let mut t = self.tables();
        if let Some(org) = live_mut(&mut t.organizations).find(|o| o.id == id) {
            org.parent_id = Some(parent_id);
        }
    }

    /// Every payment line ever written for the batch, soft-deleted included.
    pub fn all_batch_lines(&self, batch_id: &str) -> Vec<(PaymentLine, bool)> {
        self.tables()
            .lines
            .iter()
            .filter(|r| r.value.batch_id == batch_id)
            .map(|r| (r.value.clone(), r.deleted))
            .collect()
    }
}

impl Store for MemoryStore {
    async fn insert_organization(&self, org: NewOrganization) -> AppResult<u64> {
        let mut t = self.tables();
        let id = t.next_id();
        t.organizations.push(Row::live(Organization {
            id,
            name: org.name,
            level: org.level,
            parent_id: org.parent_id,
            manager_id: None,
        }));
        Ok(id)
    }

    async fn get_organization(&self, id: u64) -> AppResult<Option<Organization>> {
        Ok(live(&self.tables().organizations)
            .find(|o| o.id == id)
            .cloned())
    }

    async fn list_organizations(&self) -> AppResult<Vec<Organization>> {
        let mut orgs: Vec<_> = live(&self.tables().organizations).cloned().collect();
        orgs.sort_by_key(|o| (o.level, o.id));
        Ok(orgs)
    }

    async fn child_organizations(&self, parent_ids: &[u64]) -> AppResult<Vec<Organization>> {
        Ok(live(&self.tables().organizations)
            .filter(|o| o.parent_id.is_some_and(|p| parent_ids.contains(&p)))
            .cloned()
            .collect())
    }

    async fn set_organization_manager(&self, id: u64, manager_id: Option<u64>) -> AppResult<bool> {
        let mut t = self.tables();
        match live_mut(&mut t.organizations).find(|o| o.id == id) {
            Some(org) => {
                org.manager_id = manager_id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn organization_managed_by(&self, employee_id: u64) -> AppResult<Option<Organization>> {
        Ok(live(&self.tables().organizations)
            .find(|o| o.manager_id == Some(employee_id))
            .cloned())
    }

    async fn managed_organizations(&self) -> AppResult<Vec<Organization>> {
        Ok(live(&self.tables().organizations)
            .filter(|o| o.manager_id.is_some())
            .cloned()
            .collect())
    }

    async fn soft_delete_organization(&self, id: u64) -> AppResult<bool> {
        let mut t = self.tables();
        match t
            .organizations
            .iter_mut()
            .find(|r| !r.deleted && r.value.id == id)
        {
            Some(row) => {
                row.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_position(&self, position: NewPosition) -> AppResult<u64> {
        let mut t = self.tables();
        let taken = live(&t.positions)
            .any(|p| p.organization_id == position.organization_id && p.name == position.name);
        if taken {
            return Err(AppError::conflict("Position already exists"));
        }

        let id = t.next_id();
        t.positions.push(Row::live(Position {
            id,
            name: position.name,
            organization_id: position.organization_id,
            description: position.description,
        }));
        Ok(id)
    }

    async fn get_position(&self, id: u64) -> AppResult<Option<Position>> {
        Ok(live(&self.tables().positions).find(|p| p.id == id).cloned())
    }

    async fn positions_in(&self, organization_ids: &[u64]) -> AppResult<Vec<Position>> {
        Ok(live(&self.tables().positions)
            .filter(|p| organization_ids.contains(&p.organization_id))
            .cloned()
            .collect())
    }

    async fn soft_delete_position(&self, id: u64) -> AppResult<bool> {
        let mut t = self.tables();
        match t.positions.iter_mut().find(|r| !r.deleted && r.value.id == id) {
            Some(row) => {
                row.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_pay_item(&self, name: &str) -> AppResult<u64> {
        let mut t = self.tables();
        if live(&t.pay_items).any(|i| i.name == name) {
            return Err(AppError::conflict("Pay item already exists"));
        }

        let id = t.next_id();
        t.pay_items.push(Row::live(PayItem {
            id,
            name: name.to_string(),
            active: true,
        }));
        Ok(id)
    }

    async fn get_pay_item(&self, id: u64) -> AppResult<Option<PayItem>> {
        Ok(live(&self.tables().pay_items).find(|i| i.id == id).cloned())
    }

    async fn pay_item_by_name(&self, name: &str) -> AppResult<Option<PayItem>> {
        Ok(live(&self.tables().pay_items)
            .find(|i| i.name == name)
            .cloned())
    }

    async fn list_pay_items(&self) -> AppResult<Vec<PayItem>> {
        Ok(live(&self.tables().pay_items).cloned().collect())
    }

    async fn set_pay_item_active(&self, id: u64, active: bool) -> AppResult<bool> {
        let mut t = self.tables();
        match live_mut(&mut t.pay_items).find(|i| i.id == id) {
            Some(item) => {
                item.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn soft_delete_pay_item(&self, id: u64) -> AppResult<bool> {
        let mut t = self.tables();
        match t.pay_items.iter_mut().find(|r| !r.deleted && r.value.id == id) {
            Some(row) => {
                row.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_employee(&self, id: u64) -> AppResult<Option<Employee>> {
        Ok(live(&self.tables().employees).find(|e| e.id == id).cloned())
    }

    async fn employees_in_positions(&self, position_ids: &[u64]) -> AppResult<Vec<Employee>> {
        Ok(live(&self.tables().employees)
            .filter(|e| e.position_id.is_some_and(|p| position_ids.contains(&p)))
            .cloned()
            .collect())
    }

    async fn insert_standard_records(&self, records: Vec<NewStandardRecord>) -> AppResult<()> {
        let mut t = self.tables();
        for r in records {
            let id = t.next_id();
            t.standards.push(Row::live(StandardRecord {
                id,
                position_id: r.position_id,
                pay_item_id: r.pay_item_id,
                amount: r.amount,
                effective_date: r.effective_date,
                review_state: ReviewState::Pending,
                reviewer_id: None,
                reviewed_at: None,
                creator_id: r.creator_id,
            }));
        }
        Ok(())
    }

    async fn standard_records(
        &self,
        position_id: u64,
        approved_only: bool,
    ) -> AppResult<Vec<StandardRecord>> {
        let mut records: Vec<_> = live(&self.tables().standards)
            .filter(|r| r.position_id == position_id)
            .filter(|r| !approved_only || r.review_state == ReviewState::Approved)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.effective_date
                .cmp(&a.effective_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(records)
    }

    async fn mark_standard_records(
        &self,
        position_id: u64,
        from: ReviewState,
        to: ReviewState,
        stamp: ReviewStamp,
    ) -> AppResult<u64> {
        let mut t = self.tables();
        let mut affected = 0;
        for r in live_mut(&mut t.standards)
            .filter(|r| r.position_id == position_id && r.review_state == from)
        {
            r.review_state = to;
            r.reviewer_id = stamp.reviewer_id;
            r.reviewed_at = stamp.reviewed_at;
            affected += 1;
        }
        Ok(affected)
    }

    async fn batch_lines(&self, batch_id: &str) -> AppResult<Vec<PaymentLine>> {
        let mut lines: Vec<_> = live(&self.tables().lines)
            .filter(|l| l.batch_id == batch_id)
            .cloned()
            .collect();
        lines.sort_by_key(|l| (l.employee_id, l.id));
        Ok(lines)
    }

    async fn commit_batch(&self, batch_id: &str, lines: Vec<NewPaymentLine>) -> AppResult<u64> {
        // one guard for check, supersede and insert
        let mut t = self.tables();

        if live(&t.lines).any(|l| l.batch_id == batch_id && !l.review_state.is_closed()) {
            return Err(AppError::open_batch(batch_id));
        }

        for row in t
            .lines
            .iter_mut()
            .filter(|r| !r.deleted && r.value.batch_id == batch_id)
        {
            row.deleted = true;
        }

        let count = lines.len() as u64;
        for line in lines {
            let id = t.next_id();
            t.lines.push(Row::live(PaymentLine {
                id,
                employee_id: line.employee_id,
                pay_item_id: line.pay_item_id,
                amount: line.amount,
                pay_month: line.pay_month,
                batch_id: line.batch_id,
                organization_id: line.organization_id,
                is_bonus: line.is_bonus,
                is_deduction: line.is_deduction,
                review_state: ReviewState::Pending,
                reviewer_id: None,
                reviewed_at: None,
                creator_id: line.creator_id,
            }));
        }
        Ok(count)
    }

    async fn mark_batch(
        &self,
        batch_id: &str,
        line_ids: &[u64],
        from: ReviewState,
        to: ReviewState,
        stamp: ReviewStamp,
    ) -> AppResult<u64> {
        let mut t = self.tables();
        let matched = live(&t.lines)
            .filter(|l| l.batch_id == batch_id && l.review_state == from)
            .filter(|l| line_ids.contains(&l.id))
            .count();
        if matched != line_ids.len() {
            return Err(AppError::stale_batch(batch_id));
        }

        let mut affected = 0;
        for l in live_mut(&mut t.lines).filter(|l| line_ids.contains(&l.id)) {
            l.review_state = to;
            l.reviewer_id = stamp.reviewer_id;
            l.reviewed_at = stamp.reviewed_at;
            affected += 1;
        }
        Ok(affected)
    }

    async fn batch_page(
        &self,
        organization_ids: Option<&[u64]>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<String>, u64)> {
        let t = self.tables();
        let mut batches: Vec<(chrono::NaiveDate, String)> = Vec::new();
        for line in live(&t.lines) {
            if organization_ids.is_some_and(|ids| !ids.contains(&line.organization_id)) {
                continue;
            }
            match batches.iter_mut().find(|(_, id)| *id == line.batch_id) {
                Some((month, _)) => *month = (*month).max(line.pay_month),
                None => batches.push((line.pay_month, line.batch_id.clone())),
            }
        }
        batches.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let total = batches.len() as u64;
        let page = batches
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(_, id)| id)
            .collect();
        Ok((page, total))
    }
}
