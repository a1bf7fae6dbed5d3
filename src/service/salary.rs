use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::salary::{
    CreateSalaryRequest, SalaryHistoryQuery, TrendsQuery, UpdateSalaryRequest,
};
use crate::db::{SqlValue, bind_values_as, bind_values_scalar};
use crate::error::AppError;
use crate::model::pay_period::PayFrequency;
use crate::model::salary::{SalaryChangeType, SalaryRecord, SalaryStatus};
use crate::models::page_params;
use crate::service::calc::validate_money_map;

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct GradeStats {
    pub count: i64,
    pub average_salary: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalaryStatistics {
    pub average_salary: f64,
    pub median_salary: f64,
    pub min_salary: f64,
    pub max_salary: f64,
    pub total_employees: i64,
    #[schema(value_type = Object)]
    pub salary_distribution: BTreeMap<String, GradeStats>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrendBucket {
    #[schema(example = "2024-01")]
    pub month: String,
    pub changes: i64,
    pub total_increase: f64,
    pub average_increase: f64,
    #[schema(value_type = Object)]
    pub change_types: BTreeMap<String, i64>,
}

pub async fn fetch_salary_record(pool: &SqlitePool, id: &str) -> Result<SalaryRecord, AppError> {
    sqlx::query_as::<_, SalaryRecord>("SELECT * FROM salary_records WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Salary record not found".to_string()))
}

fn encode_map(map: &Option<BTreeMap<String, f64>>) -> Result<Option<String>, AppError> {
    match map {
        Some(m) => serde_json::to_string(m)
            .map(Some)
            .map_err(|_| AppError::Validation("Invalid amount map".to_string())),
        None => Ok(None),
    }
}

/// Appends a new ledger entry. Delta computation, supersession of the prior
/// ACTIVE record, and the insert all happen inside one transaction so two
/// concurrent changes for the same employee cannot both keep an ACTIVE row.
pub async fn create_salary_record(
    pool: &SqlitePool,
    req: &CreateSalaryRequest,
    created_by: Option<&str>,
) -> Result<SalaryRecord, AppError> {
    if req.employee_id.trim().is_empty() {
        return Err(AppError::Validation(
            "employee_id must not be empty".to_string(),
        ));
    }
    if !req.base_salary.is_finite() || req.base_salary < 0.0 {
        return Err(AppError::Validation(
            "base_salary must be a finite non-negative amount".to_string(),
        ));
    }
    if let Some(allowances) = &req.allowances {
        validate_money_map("allowances", allowances)?;
    }
    if let Some(benefits) = &req.benefits {
        validate_money_map("benefits", benefits)?;
    }

    let status = req.status.unwrap_or(SalaryStatus::Active);
    if !matches!(status, SalaryStatus::Active | SalaryStatus::Pending) {
        return Err(AppError::Validation(
            "New salary records must be ACTIVE or PENDING".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let prior = sqlx::query_as::<_, SalaryRecord>(
        "SELECT * FROM salary_records WHERE employee_id = ? ORDER BY effective_date DESC LIMIT 1",
    )
    .bind(&req.employee_id)
    .fetch_optional(&mut *tx)
    .await?;

    let previous_salary = prior.as_ref().map(|p| p.base_salary);
    let (salary_increase, percentage_increase) = match &prior {
        Some(p) if req.change_type != SalaryChangeType::Initial => {
            let increase = req.base_salary - p.base_salary;
            let percentage = if p.base_salary != 0.0 {
                increase / p.base_salary * 100.0
            } else {
                0.0
            };
            (Some(increase), Some(percentage))
        }
        _ => (None, None),
    };

    // PENDING records do not compete with the active one until approved.
    if status == SalaryStatus::Active {
        supersede_previous(&mut tx, &req.employee_id, req.effective_date).await?;
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();
    sqlx::query(
        r#"
        INSERT INTO salary_records
            (id, employee_id, effective_date, base_salary, currency, salary_grade,
             pay_frequency, allowances, benefits, change_reason, change_type,
             previous_salary, salary_increase, percentage_increase, status,
             comments, created_at, updated_at, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.employee_id)
    .bind(req.effective_date)
    .bind(req.base_salary)
    .bind(req.currency.as_deref().unwrap_or("USD"))
    .bind(&req.salary_grade)
    .bind(req.pay_frequency.unwrap_or(PayFrequency::Monthly))
    .bind(encode_map(&req.allowances)?)
    .bind(encode_map(&req.benefits)?)
    .bind(&req.change_reason)
    .bind(req.change_type)
    .bind(previous_salary)
    .bind(salary_increase)
    .bind(percentage_increase)
    .bind(status)
    .bind(&req.comments)
    .bind(now)
    .bind(now)
    .bind(created_by)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(salary_id = %id, employee_id = %req.employee_id, "Salary record created");
    fetch_salary_record(pool, &id).await
}

/// Marks ACTIVE records effective strictly before `effective_date` as
/// SUPERSEDED, ending them the day before the new record takes effect.
async fn supersede_previous(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    employee_id: &str,
    effective_date: chrono::NaiveDate,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE salary_records
        SET status = ?, end_date = ?, updated_at = ?
        WHERE employee_id = ? AND status = ? AND effective_date < ?
        "#,
    )
    .bind(SalaryStatus::Superseded)
    .bind(effective_date - chrono::Duration::days(1))
    .bind(Utc::now().naive_utc())
    .bind(employee_id)
    .bind(SalaryStatus::Active)
    .bind(effective_date)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn list_salary_history(
    pool: &SqlitePool,
    query: &SalaryHistoryQuery,
) -> Result<(Vec<SalaryRecord>, i64), AppError> {
    let (_, limit, offset) = page_params(query.page, query.limit);

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<SqlValue> = Vec::new();

    if let Some(employee_id) = query.employee_id.as_deref() {
        where_sql.push_str(" AND employee_id = ?");
        args.push(SqlValue::String(employee_id.to_string()));
    }
    if let Some(change_type) = query.change_type {
        where_sql.push_str(" AND change_type = ?");
        args.push(SqlValue::String(change_type.to_string()));
    }
    if let Some(status) = query.status {
        where_sql.push_str(" AND status = ?");
        args.push(SqlValue::String(status.to_string()));
    }
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        where_sql.push_str(" AND effective_date >= ? AND effective_date <= ?");
        args.push(SqlValue::Date(start));
        args.push(SqlValue::Date(end));
    }

    let count_sql = format!("SELECT COUNT(*) FROM salary_records{}", where_sql);
    let total: i64 = bind_values_scalar(sqlx::query_scalar(&count_sql), &args)
        .fetch_one(pool)
        .await?;

    let data_sql = format!(
        "SELECT * FROM salary_records{} ORDER BY effective_date DESC LIMIT ? OFFSET ?",
        where_sql
    );
    let records = bind_values_as(sqlx::query_as::<_, SalaryRecord>(&data_sql), &args)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((records, total))
}

pub async fn employee_salary_history(
    pool: &SqlitePool,
    employee_id: &str,
) -> Result<(Option<SalaryRecord>, Vec<SalaryRecord>), AppError> {
    let history = sqlx::query_as::<_, SalaryRecord>(
        "SELECT * FROM salary_records WHERE employee_id = ? ORDER BY effective_date DESC",
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await?;

    let current = current_salary(pool, employee_id).await?;
    Ok((current, history))
}

/// The ACTIVE record already in effect: latest effective date not in the
/// future.
pub async fn current_salary(
    pool: &SqlitePool,
    employee_id: &str,
) -> Result<Option<SalaryRecord>, AppError> {
    let record = sqlx::query_as::<_, SalaryRecord>(
        r#"
        SELECT * FROM salary_records
        WHERE employee_id = ? AND status = ? AND effective_date <= ?
        ORDER BY effective_date DESC
        LIMIT 1
        "#,
    )
    .bind(employee_id)
    .bind(SalaryStatus::Active)
    .bind(Utc::now().date_naive())
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

pub async fn update_salary_record(
    pool: &SqlitePool,
    id: &str,
    req: &UpdateSalaryRequest,
    updated_by: Option<&str>,
) -> Result<SalaryRecord, AppError> {
    let existing = fetch_salary_record(pool, id).await?;

    if existing.status == SalaryStatus::Superseded {
        return Err(AppError::IllegalState(
            "Cannot update superseded salary record".to_string(),
        ));
    }

    if let Some(base_salary) = req.base_salary {
        if !base_salary.is_finite() || base_salary < 0.0 {
            return Err(AppError::Validation(
                "base_salary must be a finite non-negative amount".to_string(),
            ));
        }
    }
    if let Some(allowances) = &req.allowances {
        validate_money_map("allowances", allowances)?;
    }
    if let Some(benefits) = &req.benefits {
        validate_money_map("benefits", benefits)?;
    }

    let allowances = match encode_map(&req.allowances)? {
        Some(json) => Some(json),
        None => existing.allowances.clone(),
    };
    let benefits = match encode_map(&req.benefits)? {
        Some(json) => Some(json),
        None => existing.benefits.clone(),
    };

    sqlx::query(
        r#"
        UPDATE salary_records
        SET effective_date = ?, base_salary = ?, salary_grade = ?, allowances = ?,
            benefits = ?, change_reason = ?, comments = ?, updated_at = ?, updated_by = ?
        WHERE id = ?
        "#,
    )
    .bind(req.effective_date.unwrap_or(existing.effective_date))
    .bind(req.base_salary.unwrap_or(existing.base_salary))
    .bind(req.salary_grade.as_ref().or(existing.salary_grade.as_ref()))
    .bind(allowances)
    .bind(benefits)
    .bind(
        req.change_reason
            .as_deref()
            .unwrap_or(&existing.change_reason),
    )
    .bind(req.comments.as_ref().or(existing.comments.as_ref()))
    .bind(Utc::now().naive_utc())
    .bind(updated_by)
    .bind(id)
    .execute(pool)
    .await?;

    tracing::info!(salary_id = %id, "Salary record updated");
    fetch_salary_record(pool, id).await
}

pub async fn approve_salary_record(
    pool: &SqlitePool,
    id: &str,
    approved_by: &str,
) -> Result<SalaryRecord, AppError> {
    let record = fetch_salary_record(pool, id).await?;

    if record.status != SalaryStatus::Pending {
        return Err(AppError::IllegalState(
            "Can only approve pending salary records".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE salary_records
        SET status = ?, approved_by = ?, approved_date = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(SalaryStatus::Active)
    .bind(approved_by)
    .bind(Utc::now().naive_utc())
    .bind(Utc::now().naive_utc())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    supersede_previous(&mut tx, &record.employee_id, record.effective_date).await?;

    tx.commit().await?;

    tracing::info!(salary_id = %id, approved_by, "Salary record approved");
    fetch_salary_record(pool, id).await
}

pub async fn salary_statistics(
    pool: &SqlitePool,
    employee_id: Option<&str>,
) -> Result<SalaryStatistics, AppError> {
    let mut where_sql = String::from(" WHERE status = ?");
    let mut args: Vec<SqlValue> = vec![SqlValue::String(SalaryStatus::Active.to_string())];
    if let Some(employee_id) = employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(SqlValue::String(employee_id.to_string()));
    }

    let sql = format!(
        "SELECT base_salary, salary_grade FROM salary_records{}",
        where_sql
    );
    let rows: Vec<(f64, Option<String>)> = bind_values_as(sqlx::query_as(&sql), &args)
        .fetch_all(pool)
        .await?;

    if rows.is_empty() {
        return Ok(SalaryStatistics {
            average_salary: 0.0,
            median_salary: 0.0,
            min_salary: 0.0,
            max_salary: 0.0,
            total_employees: 0,
            salary_distribution: BTreeMap::new(),
        });
    }

    let mut salaries: Vec<f64> = rows.iter().map(|(salary, _)| *salary).collect();
    salaries.sort_by(|a, b| a.total_cmp(b));

    let total: f64 = salaries.iter().sum();
    let average_salary = total / salaries.len() as f64;
    let median_salary = salaries[salaries.len() / 2];
    let min_salary = salaries[0];
    let max_salary = salaries[salaries.len() - 1];

    let mut salary_distribution: BTreeMap<String, GradeStats> = BTreeMap::new();
    for (salary, grade) in &rows {
        let entry = salary_distribution
            .entry(grade.clone().unwrap_or_else(|| "Unknown".to_string()))
            .or_default();
        entry.count += 1;
        entry.average_salary += salary;
    }
    for stats in salary_distribution.values_mut() {
        stats.average_salary /= stats.count as f64;
    }

    Ok(SalaryStatistics {
        average_salary,
        median_salary,
        min_salary,
        max_salary,
        total_employees: rows.len() as i64,
        salary_distribution,
    })
}

/// Buckets salary-change events by calendar month over a trailing window.
pub async fn salary_trends(
    pool: &SqlitePool,
    query: &TrendsQuery,
) -> Result<Vec<TrendBucket>, AppError> {
    let months = query.months.unwrap_or(12).max(1);
    let window_start = Utc::now()
        .date_naive()
        .checked_sub_months(chrono::Months::new(months))
        .unwrap_or(chrono::NaiveDate::MIN);

    let mut where_sql = String::from(" WHERE effective_date >= ?");
    let mut args: Vec<SqlValue> = vec![SqlValue::Date(window_start)];
    if let Some(employee_id) = query.employee_id.as_deref() {
        where_sql.push_str(" AND employee_id = ?");
        args.push(SqlValue::String(employee_id.to_string()));
    }

    let sql = format!(
        "SELECT effective_date, salary_increase, change_type FROM salary_records{} ORDER BY effective_date ASC",
        where_sql
    );
    let rows: Vec<(chrono::NaiveDate, Option<f64>, SalaryChangeType)> =
        bind_values_as(sqlx::query_as(&sql), &args)
            .fetch_all(pool)
            .await?;

    let mut buckets: BTreeMap<String, TrendBucket> = BTreeMap::new();
    for (effective_date, increase, change_type) in rows {
        let month = effective_date.format("%Y-%m").to_string();
        let bucket = buckets.entry(month.clone()).or_insert_with(|| TrendBucket {
            month,
            changes: 0,
            total_increase: 0.0,
            average_increase: 0.0,
            change_types: BTreeMap::new(),
        });
        bucket.changes += 1;
        if let Some(increase) = increase {
            bucket.total_increase += increase;
        }
        *bucket.change_types.entry(change_type.to_string()).or_insert(0) += 1;
    }

    let mut trends: Vec<TrendBucket> = buckets.into_values().collect();
    for bucket in &mut trends {
        if bucket.changes > 0 {
            bucket.average_increase = bucket.total_increase / bucket.changes as f64;
        }
    }
    Ok(trends)
}
