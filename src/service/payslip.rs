use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::payslip::{
    BulkPayslipRequest, CreatePayslipRequest, PayslipQuery, UpdatePayslipRequest,
};
use crate::db::{SqlValue, bind_values_as, bind_values_scalar};
use crate::error::{AppError, on_unique_violation};
use crate::model::payslip::{Payslip, PayslipStatus};
use crate::model::pay_period::PeriodStatus;
use crate::models::page_params;
use crate::service::{calc, pay_period, salary};

/// Slim view of the owning period attached to single-payslip responses.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct PeriodRef {
    pub id: String,
    pub name: String,
    pub status: PeriodStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkFailure {
    #[schema(example = "EMP002")]
    pub employee_id: String,
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkResult {
    pub successful: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

pub async fn fetch_payslip(pool: &SqlitePool, id: &str) -> Result<Payslip, AppError> {
    sqlx::query_as::<_, Payslip>("SELECT * FROM payslips WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Payslip not found".to_string()))
}

fn decode_map(json: Option<&str>) -> BTreeMap<String, f64> {
    json.and_then(|text| serde_json::from_str(text).ok())
        .unwrap_or_default()
}

fn validate_overtime(hours: f64) -> Result<(), AppError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(AppError::Validation(
            "overtime_hours must be a finite non-negative number".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_payslip(
    pool: &SqlitePool,
    req: &CreatePayslipRequest,
    created_by: Option<&str>,
) -> Result<Payslip, AppError> {
    if req.employee_id.trim().is_empty() {
        return Err(AppError::Validation(
            "employee_id must not be empty".to_string(),
        ));
    }
    let overtime_hours = req.overtime_hours.unwrap_or(0.0);
    validate_overtime(overtime_hours)?;

    let earnings = req.earnings.clone().unwrap_or_default();
    let deductions = req.deductions.clone().unwrap_or_default();
    calc::validate_money_map("earnings", &earnings)?;
    calc::validate_money_map("deductions", &deductions)?;

    let period = pay_period::fetch_period(pool, &req.payroll_period_id).await?;

    // Base salary comes from the ledger, not the request.
    let salary_record = salary::current_salary(pool, &req.employee_id)
        .await?
        .ok_or_else(|| {
            AppError::Validation(format!(
                "No active salary record for employee {}",
                req.employee_id
            ))
        })?;

    let working_days = calc::working_days(period.start_date, period.end_date);
    let actual_working_days = req.actual_working_days.unwrap_or(working_days);
    if actual_working_days < 0 || actual_working_days > working_days {
        return Err(AppError::Validation(format!(
            "actual_working_days must be between 0 and {}",
            working_days
        )));
    }

    let amounts = calc::calculate(&calc::PayInputs {
        base_salary: salary_record.base_salary,
        working_days,
        actual_working_days,
        overtime_hours,
        earnings: &earnings,
        deductions: &deductions,
    })?;

    // Snapshot stamped at creation time; the employee directory is external,
    // so missing fields fall back to placeholders.
    let snapshot = req.employee.clone().unwrap_or_default();
    let employee_number = snapshot.employee_number.unwrap_or_else(|| {
        let tail: String = req
            .employee_id
            .chars()
            .rev()
            .take(6)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("EMP{}", tail)
    });

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();
    let insert = sqlx::query(
        r#"
        INSERT INTO payslips
            (id, employee_id, payroll_period_id, employee_number, full_name,
             designation, department, pay_period_start, pay_period_end, pay_date,
             working_days, actual_working_days, base_salary, overtime_hours,
             overtime_rate, overtime_pay, earnings, total_earnings, deductions,
             total_deductions, taxable_income, income_tax, social_security_tax,
             medicare_tax, state_tax, local_tax, total_taxes, gross_pay, net_pay,
             currency, status, created_at, updated_at, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.employee_id)
    .bind(&req.payroll_period_id)
    .bind(&employee_number)
    .bind(snapshot.full_name.as_deref().unwrap_or("N/A"))
    .bind(snapshot.designation.as_deref().unwrap_or("N/A"))
    .bind(snapshot.department.as_deref().unwrap_or("N/A"))
    .bind(period.start_date)
    .bind(period.end_date)
    .bind(period.pay_date)
    .bind(working_days)
    .bind(actual_working_days)
    .bind(salary_record.base_salary)
    .bind(overtime_hours)
    .bind(amounts.overtime_rate)
    .bind(amounts.overtime_pay)
    .bind(serde_json::to_string(&earnings).unwrap_or_else(|_| "{}".to_string()))
    .bind(amounts.total_earnings)
    .bind(serde_json::to_string(&deductions).unwrap_or_else(|_| "{}".to_string()))
    .bind(amounts.total_deductions)
    .bind(amounts.taxable_income)
    .bind(amounts.income_tax)
    .bind(amounts.social_security_tax)
    .bind(amounts.medicare_tax)
    .bind(amounts.state_tax)
    .bind(amounts.local_tax)
    .bind(amounts.total_taxes)
    .bind(amounts.gross_pay)
    .bind(amounts.net_pay)
    .bind(&salary_record.currency)
    .bind(PayslipStatus::Generated)
    .bind(now)
    .bind(now)
    .bind(created_by)
    .execute(pool)
    .await;

    // The unique index on (employee_id, payroll_period_id) is the real
    // duplicate check; the application never pre-reads.
    insert.map_err(|e| {
        on_unique_violation(e, "Payslip already exists for this employee and period")
    })?;

    pay_period::recalculate_totals(pool, &req.payroll_period_id).await?;

    tracing::info!(payslip_id = %id, employee_id = %req.employee_id, "Payslip created");
    fetch_payslip(pool, &id).await
}

pub async fn list_payslips(
    pool: &SqlitePool,
    query: &PayslipQuery,
) -> Result<(Vec<Payslip>, i64), AppError> {
    let (_, limit, offset) = page_params(query.page, query.limit);

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<SqlValue> = Vec::new();

    if let Some(employee_id) = query.employee_id.as_deref() {
        where_sql.push_str(" AND employee_id = ?");
        args.push(SqlValue::String(employee_id.to_string()));
    }
    if let Some(period_id) = query.payroll_period_id.as_deref() {
        where_sql.push_str(" AND payroll_period_id = ?");
        args.push(SqlValue::String(period_id.to_string()));
    }
    if let Some(status) = query.status {
        where_sql.push_str(" AND status = ?");
        args.push(SqlValue::String(status.to_string()));
    }
    if let Some(department) = query.department.as_deref() {
        where_sql.push_str(" AND department LIKE ?");
        args.push(SqlValue::String(format!("%{}%", department)));
    }
    if let Some(search) = query.search.as_deref() {
        where_sql.push_str(" AND (full_name LIKE ? OR employee_number LIKE ? OR designation LIKE ?)");
        let pattern = format!("%{}%", search);
        args.push(SqlValue::String(pattern.clone()));
        args.push(SqlValue::String(pattern.clone()));
        args.push(SqlValue::String(pattern));
    }
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        where_sql.push_str(" AND pay_period_start >= ? AND pay_period_start <= ?");
        args.push(SqlValue::Date(start));
        args.push(SqlValue::Date(end));
    }

    let count_sql = format!("SELECT COUNT(*) FROM payslips{}", where_sql);
    let total: i64 = bind_values_scalar(sqlx::query_scalar(&count_sql), &args)
        .fetch_one(pool)
        .await?;

    let data_sql = format!(
        "SELECT * FROM payslips{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        where_sql
    );
    let payslips = bind_values_as(sqlx::query_as::<_, Payslip>(&data_sql), &args)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((payslips, total))
}

pub async fn get_payslip(pool: &SqlitePool, id: &str) -> Result<(Payslip, PeriodRef), AppError> {
    let payslip = fetch_payslip(pool, id).await?;
    let period = sqlx::query_as::<_, PeriodRef>(
        "SELECT id, name, status FROM payroll_periods WHERE id = ?",
    )
    .bind(&payslip.payroll_period_id)
    .fetch_one(pool)
    .await?;
    Ok((payslip, period))
}

pub async fn update_payslip(
    pool: &SqlitePool,
    id: &str,
    req: &UpdatePayslipRequest,
    updated_by: Option<&str>,
) -> Result<Payslip, AppError> {
    let existing = fetch_payslip(pool, id).await?;

    if existing.status == PayslipStatus::Paid {
        return Err(AppError::IllegalState(
            "Cannot update paid payslip".to_string(),
        ));
    }

    let status = match req.status {
        Some(next) => {
            if !existing.status.can_transition_to(next) {
                return Err(AppError::IllegalState(format!(
                    "Cannot move payslip from {} to {}",
                    existing.status, next
                )));
            }
            next
        }
        None => existing.status,
    };

    // Changes to earnings, deductions or overtime re-run the calculation
    // against the stored base values.
    let recalculate =
        req.earnings.is_some() || req.deductions.is_some() || req.overtime_hours.is_some();

    let (earnings, deductions, overtime_hours) = (
        req.earnings
            .clone()
            .unwrap_or_else(|| decode_map(existing.earnings.as_deref())),
        req.deductions
            .clone()
            .unwrap_or_else(|| decode_map(existing.deductions.as_deref())),
        req.overtime_hours.unwrap_or(existing.overtime_hours),
    );

    if recalculate {
        validate_overtime(overtime_hours)?;
        calc::validate_money_map("earnings", &earnings)?;
        calc::validate_money_map("deductions", &deductions)?;
    }

    let amounts = if recalculate {
        calc::calculate(&calc::PayInputs {
            base_salary: existing.base_salary,
            working_days: existing.working_days,
            actual_working_days: existing.actual_working_days,
            overtime_hours,
            earnings: &earnings,
            deductions: &deductions,
        })?
    } else {
        calc::PayAmounts {
            overtime_rate: existing.overtime_rate,
            overtime_pay: existing.overtime_pay,
            total_earnings: existing.total_earnings,
            total_deductions: existing.total_deductions,
            taxable_income: existing.taxable_income,
            income_tax: existing.income_tax,
            social_security_tax: existing.social_security_tax,
            medicare_tax: existing.medicare_tax,
            state_tax: existing.state_tax,
            local_tax: existing.local_tax,
            total_taxes: existing.total_taxes,
            gross_pay: existing.gross_pay,
            net_pay: existing.net_pay,
        }
    };

    sqlx::query(
        r#"
        UPDATE payslips
        SET overtime_hours = ?, overtime_rate = ?, overtime_pay = ?, earnings = ?,
            total_earnings = ?, deductions = ?, total_deductions = ?,
            taxable_income = ?, income_tax = ?, social_security_tax = ?,
            medicare_tax = ?, state_tax = ?, local_tax = ?, total_taxes = ?,
            gross_pay = ?, net_pay = ?, status = ?, notes = ?, updated_at = ?,
            updated_by = ?
        WHERE id = ?
        "#,
    )
    .bind(overtime_hours)
    .bind(amounts.overtime_rate)
    .bind(amounts.overtime_pay)
    .bind(serde_json::to_string(&earnings).unwrap_or_else(|_| "{}".to_string()))
    .bind(amounts.total_earnings)
    .bind(serde_json::to_string(&deductions).unwrap_or_else(|_| "{}".to_string()))
    .bind(amounts.total_deductions)
    .bind(amounts.taxable_income)
    .bind(amounts.income_tax)
    .bind(amounts.social_security_tax)
    .bind(amounts.medicare_tax)
    .bind(amounts.state_tax)
    .bind(amounts.local_tax)
    .bind(amounts.total_taxes)
    .bind(amounts.gross_pay)
    .bind(amounts.net_pay)
    .bind(status)
    .bind(req.notes.as_ref().or(existing.notes.as_ref()))
    .bind(Utc::now().naive_utc())
    .bind(updated_by)
    .bind(id)
    .execute(pool)
    .await?;

    pay_period::recalculate_totals(pool, &existing.payroll_period_id).await?;

    tracing::info!(payslip_id = %id, "Payslip updated");
    fetch_payslip(pool, id).await
}

pub async fn delete_payslip(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    let existing = fetch_payslip(pool, id).await?;

    if existing.status == PayslipStatus::Paid {
        return Err(AppError::IllegalState(
            "Cannot delete paid payslip".to_string(),
        ));
    }

    sqlx::query("DELETE FROM payslips WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    pay_period::recalculate_totals(pool, &existing.payroll_period_id).await?;

    tracing::info!(payslip_id = %id, "Payslip deleted");
    Ok(())
}

/// Fan-out payslip creation with per-item failure isolation: one employee's
/// error is recorded and the rest of the batch continues. Result order
/// follows the input order. Only a missing period fails the whole call.
pub async fn bulk_create_payslips(
    pool: &SqlitePool,
    req: &BulkPayslipRequest,
    created_by: Option<&str>,
) -> Result<BulkResult, AppError> {
    pay_period::fetch_period(pool, &req.payroll_period_id).await?;

    let mut result = BulkResult {
        successful: Vec::new(),
        failed: Vec::new(),
    };

    for employee_id in &req.employee_ids {
        let item = CreatePayslipRequest {
            employee_id: employee_id.clone(),
            payroll_period_id: req.payroll_period_id.clone(),
            overtime_hours: None,
            actual_working_days: None,
            earnings: None,
            deductions: None,
            employee: None,
        };
        match create_payslip(pool, &item, created_by).await {
            Ok(payslip) => result.successful.push(payslip.id),
            Err(err) => result.failed.push(BulkFailure {
                employee_id: employee_id.clone(),
                error: err.to_string(),
            }),
        }
    }

    tracing::info!(
        period_id = %req.payroll_period_id,
        successful = result.successful.len(),
        failed = result.failed.len(),
        "Bulk payslip creation completed"
    );
    Ok(result)
}
