use sqlx::{MySql, MySqlPool, QueryBuilder};

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

const ORGANIZATION_COLUMNS: &str = "id, name, level, parent_id, manager_id";
const STANDARD_COLUMNS: &str = "id, position_id, pay_item_id, amount, effective_date, review_state, reviewer_id, reviewed_at, creator_id";
const LINE_COLUMNS: &str = "id, employee_id, pay_item_id, amount, pay_month, batch_id, organization_id, is_bonus, is_deduction, review_state, reviewer_id, reviewed_at, creator_id";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn sql_state(e: &sqlx::Error) -> Option<String> {
    match e {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Duplicate key violations surface as `Conflict`, everything else as a
/// database error.
fn map_duplicate(e: sqlx::Error, what: &str) -> AppError {
    if sql_state(&e).as_deref() == Some("23000") {
        return AppError::conflict(format!("{} already exists", what));
    }
    e.into()
}

/// Appends ` IN (?, ?, ...)` for the given ids.
fn push_in_list(qb: &mut QueryBuilder<'_, MySql>, ids: &[u64]) {
    qb.push(" IN (");
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(*id);
    }
    sep.push_unseparated(")");
}

impl Store for MySqlStore {
    async fn insert_organization(&self, org: NewOrganization) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO organizations (name, level, parent_id)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&org.name)
        .bind(org.level)
        .bind(org.parent_id)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn get_organization(&self, id: u64) -> AppResult<Option<Organization>> {
        let sql = format!(
            "SELECT {} FROM organizations WHERE id = ? AND deleted = 0",
            ORGANIZATION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Organization>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_organizations(&self) -> AppResult<Vec<Organization>> {
        let sql = format!(
            "SELECT {} FROM organizations WHERE deleted = 0 ORDER BY level, id",
            ORGANIZATION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Organization>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn child_organizations(&self, parent_ids: &[u64]) -> AppResult<Vec<Organization>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<MySql>::new(format!(
            "SELECT {} FROM organizations WHERE deleted = 0 AND parent_id",
            ORGANIZATION_COLUMNS
        ));
        push_in_list(&mut qb, parent_ids);
        qb.push(" ORDER BY id");

        Ok(qb
            .build_query_as::<Organization>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn set_organization_manager(&self, id: u64, manager_id: Option<u64>) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET manager_id = ?
            WHERE id = ? AND deleted = 0
            "#,
        )
        .bind(manager_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        // MySQL reports 0 affected rows when the value is unchanged
        if result.rows_affected() > 0 {
            return Ok(true);
        }
        Ok(self.get_organization(id).await?.is_some())
    }

    async fn organization_managed_by(&self, employee_id: u64) -> AppResult<Option<Organization>> {
        let sql = format!(
            "SELECT {} FROM organizations WHERE manager_id = ? AND deleted = 0 ORDER BY id LIMIT 1",
            ORGANIZATION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Organization>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn managed_organizations(&self) -> AppResult<Vec<Organization>> {
        let sql = format!(
            "SELECT {} FROM organizations WHERE manager_id IS NOT NULL AND deleted = 0",
            ORGANIZATION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Organization>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn soft_delete_organization(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("UPDATE organizations SET deleted = 1 WHERE id = ? AND deleted = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_position(&self, position: NewPosition) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO positions (name, organization_id, description)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&position.name)
        .bind(position.organization_id)
        .bind(&position.description)
        .execute(&self.pool)
        .await
        .map_err(|e| map_duplicate(e, "Position"))?;

        Ok(result.last_insert_id())
    }

    async fn get_position(&self, id: u64) -> AppResult<Option<Position>> {
        Ok(sqlx::query_as::<_, Position>(
            r#"
            SELECT id, name, organization_id, description
            FROM positions
            WHERE id = ? AND deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn positions_in(&self, organization_ids: &[u64]) -> AppResult<Vec<Position>> {
        if organization_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT id, name, organization_id, description FROM positions WHERE deleted = 0 AND organization_id",
        );
        push_in_list(&mut qb, organization_ids);
        qb.push(" ORDER BY id");

        Ok(qb.build_query_as::<Position>().fetch_all(&self.pool).await?)
    }

    async fn soft_delete_position(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE positions SET deleted = 1, deleted_token = id WHERE id = ? AND deleted = 0",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_pay_item(&self, name: &str) -> AppResult<u64> {
        let result = sqlx::query("INSERT INTO pay_items (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_duplicate(e, "Pay item"))?;

        Ok(result.last_insert_id())
    }

    async fn get_pay_item(&self, id: u64) -> AppResult<Option<PayItem>> {
        Ok(sqlx::query_as::<_, PayItem>(
            "SELECT id, name, active FROM pay_items WHERE id = ? AND deleted = 0",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn pay_item_by_name(&self, name: &str) -> AppResult<Option<PayItem>> {
        Ok(sqlx::query_as::<_, PayItem>(
            "SELECT id, name, active FROM pay_items WHERE name = ? AND deleted = 0",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_pay_items(&self) -> AppResult<Vec<PayItem>> {
        Ok(sqlx::query_as::<_, PayItem>(
            "SELECT id, name, active FROM pay_items WHERE deleted = 0 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn set_pay_item_active(&self, id: u64, active: bool) -> AppResult<bool> {
        sqlx::query("UPDATE pay_items SET active = ? WHERE id = ? AND deleted = 0")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(self.get_pay_item(id).await?.is_some())
    }

    async fn soft_delete_pay_item(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE pay_items SET deleted = 1, deleted_token = id WHERE id = ? AND deleted = 0",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_employee(&self, id: u64) -> AppResult<Option<Employee>> {
        Ok(sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, employee_code, first_name, last_name, phone, position_id
            FROM employees
            WHERE id = ? AND deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn employees_in_positions(&self, position_ids: &[u64]) -> AppResult<Vec<Employee>> {
        if position_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT id, employee_code, first_name, last_name, phone, position_id FROM employees WHERE deleted = 0 AND position_id",
        );
        push_in_list(&mut qb, position_ids);
        qb.push(" ORDER BY id");

        Ok(qb.build_query_as::<Employee>().fetch_all(&self.pool).await?)
    }

    async fn insert_standard_records(&self, records: Vec<NewStandardRecord>) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<MySql>::new(
            "INSERT INTO standard_records (position_id, pay_item_id, amount, effective_date, creator_id) ",
        );
        qb.push_values(records, |mut b, r| {
            b.push_bind(r.position_id)
                .push_bind(r.pay_item_id)
                .push_bind(r.amount)
                .push_bind(r.effective_date)
                .push_bind(r.creator_id);
        });
        qb.build().execute(&self.pool).await?;

        Ok(())
    }

    async fn standard_records(
        &self,
        position_id: u64,
        approved_only: bool,
    ) -> AppResult<Vec<StandardRecord>> {
        let filter = if approved_only {
            " AND review_state = 'approved'"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {} FROM standard_records WHERE position_id = ? AND deleted = 0{} ORDER BY effective_date DESC, id DESC",
            STANDARD_COLUMNS, filter
        );

        Ok(sqlx::query_as::<_, StandardRecord>(&sql)
            .bind(position_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn mark_standard_records(
        &self,
        position_id: u64,
        from: ReviewState,
        to: ReviewState,
        stamp: ReviewStamp,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE standard_records
            SET review_state = ?, reviewer_id = ?, reviewed_at = ?
            WHERE position_id = ? AND review_state = ? AND deleted = 0
            "#,
        )
        .bind(to.as_ref())
        .bind(stamp.reviewer_id)
        .bind(stamp.reviewed_at)
        .bind(position_id)
        .bind(from.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn batch_lines(&self, batch_id: &str) -> AppResult<Vec<PaymentLine>> {
        let sql = format!(
            "SELECT {} FROM payment_lines WHERE batch_id = ? AND deleted = 0 ORDER BY employee_id, id",
            LINE_COLUMNS
        );
        Ok(sqlx::query_as::<_, PaymentLine>(&sql)
            .bind(batch_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn commit_batch(&self, batch_id: &str, lines: Vec<NewPaymentLine>) -> AppResult<u64> {
        if lines.is_empty() {
            return Err(AppError::validation("Nothing to register"));
        }
        let count = lines.len() as u64;
        let mut tx = self.pool.begin().await?;

        // next-key locks on idx_line_batch serialize concurrent registrations
        let states = sqlx::query_scalar::<_, String>(
            "SELECT review_state FROM payment_lines WHERE batch_id = ? AND deleted = 0 FOR UPDATE",
        )
        .bind(batch_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_contention(e, batch_id))?;

        let open = states.iter().any(|s| {
            ReviewState::try_from(s.clone())
                .map(|state| !state.is_closed())
                .unwrap_or(true)
        });
        if open {
            return Err(AppError::open_batch(batch_id));
        }

        if !states.is_empty() {
            sqlx::query("UPDATE payment_lines SET deleted = 1 WHERE batch_id = ? AND deleted = 0")
                .bind(batch_id)
                .execute(&mut *tx)
                .await?;
        }

        let mut qb = QueryBuilder::<MySql>::new(
            "INSERT INTO payment_lines (employee_id, pay_item_id, amount, pay_month, batch_id, organization_id, is_bonus, is_deduction, creator_id) ",
        );
        qb.push_values(lines, |mut b, line| {
            b.push_bind(line.employee_id)
                .push_bind(line.pay_item_id)
                .push_bind(line.amount)
                .push_bind(line.pay_month)
                .push_bind(line.batch_id)
                .push_bind(line.organization_id)
                .push_bind(line.is_bonus)
                .push_bind(line.is_deduction)
                .push_bind(line.creator_id);
        });
        qb.build()
            .execute(&mut *tx)
            .await
            .map_err(|e| map_contention(e, batch_id))?;

        tx.commit().await.map_err(|e| map_contention(e, batch_id))?;

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
        if line_ids.is_empty() {
            return Err(AppError::stale_batch(batch_id));
        }
        let mut tx = self.pool.begin().await?;

        let mut lock = QueryBuilder::<MySql>::new(
            "SELECT COUNT(*) FROM payment_lines WHERE deleted = 0 AND batch_id = ",
        );
        lock.push_bind(batch_id)
            .push(" AND review_state = ")
            .push_bind(from.to_string())
            .push(" AND id");
        push_in_list(&mut lock, line_ids);
        lock.push(" FOR UPDATE");

        let matched: i64 = lock.build_query_scalar().fetch_one(&mut *tx).await?;
        if matched as usize != line_ids.len() {
            return Err(AppError::stale_batch(batch_id));
        }

        let mut update = QueryBuilder::<MySql>::new("UPDATE payment_lines SET review_state = ");
        update
            .push_bind(to.to_string())
            .push(", reviewer_id = ")
            .push_bind(stamp.reviewer_id)
            .push(", reviewed_at = ")
            .push_bind(stamp.reviewed_at)
            .push(" WHERE deleted = 0 AND id");
        push_in_list(&mut update, line_ids);
        update.build().execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(line_ids.len() as u64)
    }

    async fn batch_page(
        &self,
        organization_ids: Option<&[u64]>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<String>, u64)> {
        if organization_ids.is_some_and(|ids| ids.is_empty()) {
            return Ok((Vec::new(), 0));
        }

        let mut count_qb = QueryBuilder::<MySql>::new(
            "SELECT COUNT(DISTINCT batch_id) FROM payment_lines WHERE deleted = 0",
        );
        if let Some(ids) = organization_ids {
            count_qb.push(" AND organization_id");
            push_in_list(&mut count_qb, ids);
        }
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT batch_id FROM payment_lines WHERE deleted = 0",
        );
        if let Some(ids) = organization_ids {
            qb.push(" AND organization_id");
            push_in_list(&mut qb, ids);
        }
        qb.push(" GROUP BY batch_id ORDER BY MAX(pay_month) DESC, batch_id LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let ids: Vec<String> = qb.build_query_scalar().fetch_all(&self.pool).await?;

        Ok((ids, total.max(0) as u64))
    }
}

/// Lock waits and deadlocks between two registrations of the same batch
/// mean another caller won the race.
fn map_contention(e: sqlx::Error, batch_id: &str) -> AppError {
    match sql_state(&e).as_deref() {
        Some("40001") => {
            tracing::warn!(error = %e, batch_id, "Concurrent registration for batch");
            AppError::open_batch(batch_id)
        }
        _ => e.into(),
    }
}
