use std::str::FromStr;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::{error, warn};

use super::{
    ApprovalOutcome, BookingStore, EmployeeDirectory, StoreResult, VacationRepository,
};
use crate::model::booking::{Booking, BookingStatus, BookingUpdate, NewBooking};
use crate::model::employee::Employee;
use crate::utils::calendar::DateRange;
use crate::utils::db_utils::{SqlUpdate, SqlValue, build_update_sql, execute_update};

const EMPLOYEE_COLUMNS: &str =
    "id, name, email, clinic, department, annual_vacation_days, used_vacation_days";

const BOOKING_COLUMNS: &str =
    "id, employee_id, clinic, department, start_date, end_date, status, rejection_reason, created_at";

#[derive(FromRow)]
struct BookingRow {
    id: u64,
    employee_id: u64,
    clinic: String,
    department: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = anyhow::Error;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        DateRange::new(row.start_date, row.end_date)
            .with_context(|| format!("booking {} has an invalid date range", row.id))?;
        let status = BookingStatus::from_str(&row.status)
            .map_err(|_| anyhow!("booking {} has unknown status {:?}", row.id, row.status))?;

        Ok(Booking {
            id: row.id,
            employee_id: row.employee_id,
            clinic: row.clinic,
            department: row.department,
            start_date: row.start_date,
            end_date: row.end_date,
            status,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
        })
    }
}

fn booking_update_sql(id: u64, update: &BookingUpdate) -> anyhow::Result<SqlUpdate> {
    build_update_sql(
        "vacation_bookings",
        vec![
            ("status", SqlValue::String(update.status.to_string())),
            ("rejection_reason", update.rejection_reason.clone().into()),
        ],
        "id",
        id,
        Some((
            "status",
            SqlValue::String(BookingStatus::Pending.to_string()),
        )),
    )
}

const INCREMENT_USED_SQL: &str = r#"
    UPDATE employees
    SET used_vacation_days = used_vacation_days + ?
    WHERE id = ?
    AND used_vacation_days + ? <= annual_vacation_days
"#;

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_bookings(
        &self,
        sql: &str,
        binds: &[&str],
    ) -> StoreResult<Vec<Booking>> {
        let mut query = sqlx::query_as::<_, BookingRow>(sql);
        for bind in binds {
            query = query.bind(*bind);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(|e| {
            error!(error = %e, "Failed to fetch vacation bookings");
            e
        })?;
        rows.into_iter().map(Booking::try_from).collect()
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .context("looking up employee by email")?;
        Ok(employee)
    }

    async fn get_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("fetching employee {id}"))?;
        Ok(employee)
    }
}

#[async_trait]
impl BookingStore for MySqlStore {
    async fn create(&self, booking: NewBooking) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO vacation_bookings
                (employee_id, clinic, department, start_date, end_date, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(booking.employee_id)
        .bind(&booking.clinic)
        .bind(&booking.department)
        .bind(booking.range.start())
        .bind(booking.range.end())
        .bind(BookingStatus::Pending.as_str())
        .bind(booking.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id = booking.employee_id, "Failed to create vacation booking");
            e
        })?;

        Ok(result.last_insert_id())
    }

    async fn get(&self, id: u64) -> StoreResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM vacation_bookings WHERE id = ?");
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("fetching booking {id}"))?;
        row.map(Booking::try_from).transpose()
    }

    async fn update(&self, id: u64, update: BookingUpdate) -> StoreResult<bool> {
        let affected = execute_update(&self.pool, booking_update_sql(id, &update)?)
            .await
            .with_context(|| format!("updating booking {id}"))?;
        Ok(affected == 1)
    }

    async fn list_all(&self) -> StoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM vacation_bookings ORDER BY created_at DESC, id DESC"
        );
        self.fetch_bookings(&sql, &[]).await
    }

    async fn list_for_slot(&self, clinic: &str, department: &str) -> StoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM vacation_bookings \
             WHERE clinic = ? AND department = ? ORDER BY start_date"
        );
        self.fetch_bookings(&sql, &[clinic, department]).await
    }
}

#[async_trait]
impl VacationRepository for MySqlStore {
    async fn record_approval(
        &self,
        booking_id: u64,
        employee_id: u64,
        days: u32,
    ) -> StoreResult<ApprovalOutcome> {
        let mut tx = self.pool.begin().await.context("starting approval transaction")?;

        let approved = execute_update(
            &mut *tx,
            booking_update_sql(booking_id, &BookingUpdate::approve())?,
        )
        .await
        .with_context(|| format!("approving booking {booking_id}"))?;
        if approved != 1 {
            tx.rollback().await?;
            return Ok(ApprovalOutcome::NotPending);
        }

        let charged = sqlx::query(INCREMENT_USED_SQL)
            .bind(days)
            .bind(employee_id)
            .bind(days)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("charging {days} days to employee {employee_id}"))?;
        if charged.rows_affected() != 1 {
            warn!(booking_id, employee_id, days, "Balance no longer covers approval, rolling back");
            tx.rollback().await?;
            return Ok(ApprovalOutcome::BalanceExceeded);
        }

        tx.commit().await.context("committing approval")?;
        Ok(ApprovalOutcome::Recorded)
    }
}
