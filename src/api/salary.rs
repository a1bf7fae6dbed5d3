use std::collections::BTreeMap;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::actor::ActingUser;
use crate::error::AppError;
use crate::model::pay_period::PayFrequency;
use crate::model::salary::{SalaryChangeType, SalaryRecord, SalaryStatus};
use crate::models::{Pagination, page_params, parse_json_column};
use crate::service::salary as service;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSalaryRequest {
    #[schema(example = "EMP001")]
    pub employee_id: String,

    #[schema(example = 5000.0)]
    pub base_salary: f64,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub effective_date: NaiveDate,

    #[schema(example = "Initial hire")]
    pub change_reason: String,
    pub change_type: SalaryChangeType,

    pub salary_grade: Option<String>,
    /// Defaults to MONTHLY
    pub pay_frequency: Option<PayFrequency>,
    /// Defaults to USD
    pub currency: Option<String>,

    #[schema(value_type = Option<Object>)]
    pub allowances: Option<BTreeMap<String, f64>>,
    #[schema(value_type = Option<Object>)]
    pub benefits: Option<BTreeMap<String, f64>>,

    pub comments: Option<String>,
    /// ACTIVE (default) takes effect immediately; PENDING waits for approval.
    pub status: Option<SalaryStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSalaryRequest {
    pub base_salary: Option<f64>,
    #[schema(value_type = Option<String>, format = "date")]
    pub effective_date: Option<NaiveDate>,
    pub change_reason: Option<String>,
    pub salary_grade: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub allowances: Option<BTreeMap<String, f64>>,
    #[schema(value_type = Option<Object>)]
    pub benefits: Option<BTreeMap<String, f64>>,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SalaryHistoryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub employee_id: Option<String>,
    pub change_type: Option<SalaryChangeType>,
    pub status: Option<SalaryStatus>,
    /// Lower bound on effective date
    #[param(value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    /// Upper bound on effective date
    #[param(value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatisticsQuery {
    pub employee_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrendsQuery {
    pub employee_id: Option<String>,
    /// Trailing window in months, default 12
    pub months: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalaryHistoryResponse {
    #[schema(value_type = Vec<SalaryRecord>)]
    pub salary_records: Vec<Value>,
    pub pagination: Pagination,
}

/// Re-inflates the JSON text columns into objects for the response body.
fn record_json(record: &SalaryRecord) -> Value {
    let mut value = serde_json::to_value(record).unwrap_or(Value::Null);
    if let Value::Object(fields) = &mut value {
        fields.insert(
            "allowances".to_string(),
            parse_json_column(record.allowances.as_deref()),
        );
        fields.insert(
            "benefits".to_string(),
            parse_json_column(record.benefits.as_deref()),
        );
    }
    value
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll/salary",
    request_body = CreateSalaryRequest,
    responses(
        (status = 201, description = "Salary record created", body = SalaryRecord),
        (status = 400, description = "Invalid payload")
    ),
    tag = "Salary"
)]
pub async fn create_salary(
    actor: ActingUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateSalaryRequest>,
) -> Result<HttpResponse, AppError> {
    let record = service::create_salary_record(pool.get_ref(), &payload, actor.id()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "data": record_json(&record),
        "message": "Salary record created successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/salary/history",
    params(SalaryHistoryQuery),
    responses(
        (status = 200, description = "Paginated salary history", body = SalaryHistoryResponse)
    ),
    tag = "Salary"
)]
pub async fn salary_history(
    pool: web::Data<SqlitePool>,
    query: web::Query<SalaryHistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let (records, total) = service::list_salary_history(pool.get_ref(), &query).await?;
    let (page, limit, _) = page_params(query.page, query.limit);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": SalaryHistoryResponse {
            salary_records: records.iter().map(record_json).collect(),
            pagination: Pagination::new(page, limit, total),
        }
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/salary/employees/{employee_id}/history",
    params(("employee_id", description = "Employee ID")),
    responses(
        (status = 200, description = "Current salary plus full history")
    ),
    tag = "Salary"
)]
pub async fn employee_salary_history(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let (current, history) =
        service::employee_salary_history(pool.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {
            "current_salary": current.as_ref().map(record_json),
            "history": history.iter().map(record_json).collect::<Vec<_>>(),
        }
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/salary/employees/{employee_id}/current",
    params(("employee_id", description = "Employee ID")),
    responses(
        (status = 200, description = "Active salary record", body = SalaryRecord),
        (status = 404, description = "No active salary record")
    ),
    tag = "Salary"
)]
pub async fn current_salary(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    let record = service::current_salary(pool.get_ref(), &employee_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No active salary record found for employee {}",
                employee_id
            ))
        })?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": record_json(&record)
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/payroll/salary/{id}",
    request_body = UpdateSalaryRequest,
    params(("id", description = "Salary record ID")),
    responses(
        (status = 200, description = "Salary record updated", body = SalaryRecord),
        (status = 400, description = "Record is superseded"),
        (status = 404, description = "Record not found")
    ),
    tag = "Salary"
)]
pub async fn update_salary(
    actor: ActingUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    payload: web::Json<UpdateSalaryRequest>,
) -> Result<HttpResponse, AppError> {
    let record =
        service::update_salary_record(pool.get_ref(), &path.into_inner(), &payload, actor.id())
            .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": record_json(&record),
        "message": "Salary record updated successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll/salary/{id}/approve",
    params(("id", description = "Salary record ID")),
    responses(
        (status = 200, description = "Salary record approved", body = SalaryRecord),
        (status = 400, description = "Record is not PENDING"),
        (status = 404, description = "Record not found")
    ),
    tag = "Salary"
)]
pub async fn approve_salary(
    actor: ActingUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let approver = actor.require()?;
    let record =
        service::approve_salary_record(pool.get_ref(), &path.into_inner(), approver).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": record_json(&record),
        "message": "Salary record approved successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/salary/statistics",
    params(StatisticsQuery),
    responses(
        (status = 200, description = "Aggregate salary statistics",
         body = crate::service::salary::SalaryStatistics)
    ),
    tag = "Salary"
)]
pub async fn salary_statistics(
    pool: web::Data<SqlitePool>,
    query: web::Query<StatisticsQuery>,
) -> Result<HttpResponse, AppError> {
    let stats = service::salary_statistics(pool.get_ref(), query.employee_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": stats
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/salary/trends",
    params(TrendsQuery),
    responses(
        (status = 200, description = "Monthly salary change buckets",
         body = Vec<crate::service::salary::TrendBucket>)
    ),
    tag = "Salary"
)]
pub async fn salary_trends(
    pool: web::Data<SqlitePool>,
    query: web::Query<TrendsQuery>,
) -> Result<HttpResponse, AppError> {
    let trends = service::salary_trends(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": trends
    })))
}
