use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::pay_period::{CreatePeriodRequest, PeriodQuery, UpdatePeriodRequest};
use crate::db::{SqlValue, bind_values_as, bind_values_scalar};
use crate::error::AppError;
use crate::model::pay_period::{PayFrequency, PayPeriod, PeriodStatus};
use crate::model::payslip::PayslipStatus;
use crate::models::page_params;

/// Per-payslip summary embedded in a single-period response.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct PayslipSummary {
    pub id: String,
    pub employee_id: String,
    pub full_name: String,
    pub status: PayslipStatus,
    pub gross_pay: f64,
    pub net_pay: f64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct PeriodTotals {
    pub total_employees: i64,
    pub total_gross_pay: f64,
    pub total_deductions: f64,
    pub total_net_pay: f64,
}

fn validate_dates(start: NaiveDate, end: NaiveDate, pay: NaiveDate) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::Validation(
            "start_date must be before end_date".to_string(),
        ));
    }
    if end > pay {
        return Err(AppError::Validation(
            "pay_date must not be before end_date".to_string(),
        ));
    }
    Ok(())
}

pub async fn fetch_period(pool: &SqlitePool, id: &str) -> Result<PayPeriod, AppError> {
    sqlx::query_as::<_, PayPeriod>("SELECT * FROM payroll_periods WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Payroll period not found".to_string()))
}

pub async fn create_period(
    pool: &SqlitePool,
    req: &CreatePeriodRequest,
    created_by: Option<&str>,
) -> Result<PayPeriod, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    validate_dates(req.start_date, req.end_date, req.pay_date)?;

    let mut tx = pool.begin().await?;

    // Three-way interval intersection against every non-cancelled period:
    // new start inside existing, new end inside existing, existing inside new.
    let overlapping: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM payroll_periods
        WHERE status <> ?
          AND ((start_date <= ? AND end_date >= ?)
            OR (start_date <= ? AND end_date >= ?)
            OR (start_date >= ? AND end_date <= ?))
        "#,
    )
    .bind(PeriodStatus::Cancelled)
    .bind(req.start_date)
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(req.end_date)
    .bind(req.start_date)
    .bind(req.end_date)
    .fetch_one(&mut *tx)
    .await?;

    if overlapping > 0 {
        return Err(AppError::Conflict(
            "Payroll period overlaps with existing period".to_string(),
        ));
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();
    sqlx::query(
        r#"
        INSERT INTO payroll_periods
            (id, name, description, start_date, end_date, pay_date, frequency,
             currency, status, created_at, updated_at, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(req.pay_date)
    .bind(req.frequency.unwrap_or(PayFrequency::Monthly))
    .bind(req.currency.as_deref().unwrap_or("USD"))
    .bind(PeriodStatus::Draft)
    .bind(now)
    .bind(now)
    .bind(created_by)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(period_id = %id, "Payroll period created");
    fetch_period(pool, &id).await
}

pub async fn list_periods(
    pool: &SqlitePool,
    query: &PeriodQuery,
) -> Result<(Vec<PayPeriod>, i64), AppError> {
    let (_, limit, offset) = page_params(query.page, query.limit);

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<SqlValue> = Vec::new();

    if let Some(status) = query.status {
        where_sql.push_str(" AND status = ?");
        args.push(SqlValue::String(status.to_string()));
    }
    if let Some(frequency) = query.frequency {
        where_sql.push_str(" AND frequency = ?");
        args.push(SqlValue::String(frequency.to_string()));
    }
    if let Some(search) = query.search.as_deref() {
        where_sql.push_str(" AND (name LIKE ? OR description LIKE ?)");
        let pattern = format!("%{}%", search);
        args.push(SqlValue::String(pattern.clone()));
        args.push(SqlValue::String(pattern));
    }
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        where_sql.push_str(" AND start_date >= ? AND start_date <= ?");
        args.push(SqlValue::Date(start));
        args.push(SqlValue::Date(end));
    }
    if let Some(year) = query.year {
        match query.month {
            Some(month) => {
                let (first, last) = month_bounds(year, month)?;
                where_sql.push_str(" AND start_date >= ? AND start_date <= ?");
                args.push(SqlValue::Date(first));
                args.push(SqlValue::Date(last));
            }
            None => {
                where_sql.push_str(" AND start_date >= ? AND start_date <= ?");
                args.push(SqlValue::Date(ymd(year, 1, 1)?));
                args.push(SqlValue::Date(ymd(year, 12, 31)?));
            }
        }
    }

    let count_sql = format!("SELECT COUNT(*) FROM payroll_periods{}", where_sql);
    let total: i64 = bind_values_scalar(sqlx::query_scalar(&count_sql), &args)
        .fetch_one(pool)
        .await?;

    let data_sql = format!(
        "SELECT * FROM payroll_periods{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        where_sql
    );
    let periods = bind_values_as(sqlx::query_as::<_, PayPeriod>(&data_sql), &args)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((periods, total))
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, AppError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| AppError::Validation("Invalid year/month filter".to_string()))
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AppError> {
    let first = ymd(year, month, 1)?;
    let next = if month == 12 {
        ymd(year + 1, 1, 1)?
    } else {
        ymd(year, month + 1, 1)?
    };
    Ok((first, next - chrono::Duration::days(1)))
}

pub async fn get_period(
    pool: &SqlitePool,
    id: &str,
) -> Result<(PayPeriod, Vec<PayslipSummary>), AppError> {
    let period = fetch_period(pool, id).await?;
    let payslips = sqlx::query_as::<_, PayslipSummary>(
        r#"
        SELECT id, employee_id, full_name, status, gross_pay, net_pay
        FROM payslips
        WHERE payroll_period_id = ?
        ORDER BY full_name
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok((period, payslips))
}

pub async fn update_period(
    pool: &SqlitePool,
    id: &str,
    req: &UpdatePeriodRequest,
    updated_by: Option<&str>,
) -> Result<PayPeriod, AppError> {
    let existing = fetch_period(pool, id).await?;

    if existing.status == PeriodStatus::Closed {
        return Err(AppError::IllegalState(
            "Cannot update closed payroll period".to_string(),
        ));
    }

    let start = req.start_date.unwrap_or(existing.start_date);
    let end = req.end_date.unwrap_or(existing.end_date);
    let pay = req.pay_date.unwrap_or(existing.pay_date);
    if req.start_date.is_some() || req.end_date.is_some() || req.pay_date.is_some() {
        validate_dates(start, end, pay)?;
    }

    let status = match req.status {
        Some(next) => {
            if !existing.status.can_transition_to(next) {
                return Err(AppError::IllegalState(format!(
                    "Cannot move payroll period from {} to {}",
                    existing.status, next
                )));
            }
            next
        }
        None => existing.status,
    };

    sqlx::query(
        r#"
        UPDATE payroll_periods
        SET name = ?, description = ?, start_date = ?, end_date = ?, pay_date = ?,
            status = ?, processing_notes = ?, updated_at = ?, updated_by = ?
        WHERE id = ?
        "#,
    )
    .bind(req.name.as_deref().unwrap_or(&existing.name))
    .bind(req.description.as_ref().or(existing.description.as_ref()))
    .bind(start)
    .bind(end)
    .bind(pay)
    .bind(status)
    .bind(
        req.processing_notes
            .as_ref()
            .or(existing.processing_notes.as_ref()),
    )
    .bind(Utc::now().naive_utc())
    .bind(updated_by)
    .bind(id)
    .execute(pool)
    .await?;

    tracing::info!(period_id = %id, "Payroll period updated");
    fetch_period(pool, id).await
}

pub async fn delete_period(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    fetch_period(pool, id).await?;

    let payslips: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM payslips WHERE payroll_period_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if payslips > 0 {
        return Err(AppError::IllegalState(
            "Cannot delete payroll period with existing payslips".to_string(),
        ));
    }

    sqlx::query("DELETE FROM payroll_periods WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    tracing::info!(period_id = %id, "Payroll period deleted");
    Ok(())
}

pub async fn approve_period(
    pool: &SqlitePool,
    id: &str,
    approved_by: &str,
) -> Result<PayPeriod, AppError> {
    let period = fetch_period(pool, id).await?;

    if period.status != PeriodStatus::Processed {
        return Err(AppError::IllegalState(
            "Can only approve processed payroll periods".to_string(),
        ));
    }

    sqlx::query(
        r#"
        UPDATE payroll_periods
        SET status = ?, approved_by = ?, approved_date = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(PeriodStatus::Approved)
    .bind(approved_by)
    .bind(Utc::now().naive_utc())
    .bind(Utc::now().naive_utc())
    .bind(id)
    .execute(pool)
    .await?;

    tracing::info!(period_id = %id, approved_by, "Payroll period approved");
    fetch_period(pool, id).await
}

pub async fn close_period(
    pool: &SqlitePool,
    id: &str,
    closed_by: &str,
) -> Result<PayPeriod, AppError> {
    let period = fetch_period(pool, id).await?;

    if period.status != PeriodStatus::Paid {
        return Err(AppError::IllegalState(
            "Can only close paid payroll periods".to_string(),
        ));
    }

    let unpaid: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM payslips WHERE payroll_period_id = ? AND status <> ?",
    )
    .bind(id)
    .bind(PayslipStatus::Paid)
    .fetch_one(pool)
    .await?;
    if unpaid > 0 {
        return Err(AppError::IllegalState(
            "Cannot close period with unpaid payslips".to_string(),
        ));
    }

    sqlx::query(
        r#"
        UPDATE payroll_periods
        SET status = ?, closed_by = ?, closed_date = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(PeriodStatus::Closed)
    .bind(closed_by)
    .bind(Utc::now().naive_utc())
    .bind(Utc::now().naive_utc())
    .bind(id)
    .execute(pool)
    .await?;

    tracing::info!(period_id = %id, closed_by, "Payroll period closed");
    fetch_period(pool, id).await
}

/// Re-aggregates payslip sums back onto the owning period row. Called after
/// every payslip mutation and exposed as an action endpoint.
pub async fn recalculate_totals(pool: &SqlitePool, id: &str) -> Result<PeriodTotals, AppError> {
    fetch_period(pool, id).await?;

    let totals = sqlx::query_as::<_, PeriodTotals>(
        r#"
        SELECT
            COUNT(*) AS total_employees,
            COALESCE(SUM(gross_pay), 0.0) AS total_gross_pay,
            COALESCE(SUM(total_deductions), 0.0) AS total_deductions,
            COALESCE(SUM(net_pay), 0.0) AS total_net_pay
        FROM payslips
        WHERE payroll_period_id = ?
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        r#"
        UPDATE payroll_periods
        SET total_employees = ?, total_gross_pay = ?, total_deductions = ?,
            total_net_pay = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(totals.total_employees)
    .bind(totals.total_gross_pay)
    .bind(totals.total_deductions)
    .bind(totals.total_net_pay)
    .bind(Utc::now().naive_utc())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(totals)
}
