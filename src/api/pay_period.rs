use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::actor::ActingUser;
use crate::error::AppError;
use crate::model::pay_period::{PayFrequency, PayPeriod, PeriodStatus};
use crate::models::{Pagination, page_params};
use crate::service::pay_period as service;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePeriodRequest {
    #[schema(example = "January 2024")]
    pub name: String,
    pub description: Option<String>,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-31", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = "2024-02-05", value_type = String, format = "date")]
    pub pay_date: NaiveDate,

    /// Defaults to MONTHLY
    pub frequency: Option<PayFrequency>,
    /// Defaults to USD
    #[schema(example = "USD")]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePeriodRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub pay_date: Option<NaiveDate>,
    pub status: Option<PeriodStatus>,
    pub processing_notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PeriodQuery {
    /// Pagination page number (1-based)
    pub page: Option<u32>,
    /// Page size, capped at 100
    pub limit: Option<u32>,
    /// Matches against name and description
    pub search: Option<String>,
    pub status: Option<PeriodStatus>,
    pub frequency: Option<PayFrequency>,
    /// Lower bound on period start date
    #[param(value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    /// Upper bound on period start date
    #[param(value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PeriodListResponse {
    pub payroll_periods: Vec<PayPeriod>,
    pub pagination: Pagination,
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods",
    request_body = CreatePeriodRequest,
    responses(
        (status = 201, description = "Payroll period created", body = PayPeriod),
        (status = 400, description = "Invalid dates"),
        (status = 409, description = "Overlapping period")
    ),
    tag = "Periods"
)]
pub async fn create_period(
    actor: ActingUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreatePeriodRequest>,
) -> Result<HttpResponse, AppError> {
    let period = service::create_period(pool.get_ref(), &payload, actor.id()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "data": period,
        "message": "Payroll period created successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/periods",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Paginated period list", body = PeriodListResponse)
    ),
    tag = "Periods"
)]
pub async fn list_periods(
    pool: web::Data<SqlitePool>,
    query: web::Query<PeriodQuery>,
) -> Result<HttpResponse, AppError> {
    let (periods, total) = service::list_periods(pool.get_ref(), &query).await?;
    let (page, limit, _) = page_params(query.page, query.limit);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": PeriodListResponse {
            payroll_periods: periods,
            pagination: Pagination::new(page, limit, total),
        }
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/periods/{id}",
    params(("id", description = "Payroll period ID")),
    responses(
        (status = 200, description = "Period with payslip summaries"),
        (status = 404, description = "Period not found")
    ),
    tag = "Periods"
)]
pub async fn get_period(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let (period, payslips) = service::get_period(pool.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": { "period": period, "payslips": payslips }
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/payroll/periods/{id}",
    request_body = UpdatePeriodRequest,
    params(("id", description = "Payroll period ID")),
    responses(
        (status = 200, description = "Period updated", body = PayPeriod),
        (status = 400, description = "Closed period or illegal transition"),
        (status = 404, description = "Period not found")
    ),
    tag = "Periods"
)]
pub async fn update_period(
    actor: ActingUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    payload: web::Json<UpdatePeriodRequest>,
) -> Result<HttpResponse, AppError> {
    let period =
        service::update_period(pool.get_ref(), &path.into_inner(), &payload, actor.id()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": period,
        "message": "Payroll period updated successfully"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/payroll/periods/{id}",
    params(("id", description = "Payroll period ID")),
    responses(
        (status = 200, description = "Period deleted"),
        (status = 400, description = "Period owns payslips"),
        (status = 404, description = "Period not found")
    ),
    tag = "Periods"
)]
pub async fn delete_period(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    service::delete_period(pool.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Payroll period deleted successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods/{id}/approve",
    params(("id", description = "Payroll period ID")),
    responses(
        (status = 200, description = "Period approved", body = PayPeriod),
        (status = 400, description = "Period is not PROCESSED"),
        (status = 404, description = "Period not found")
    ),
    tag = "Periods"
)]
pub async fn approve_period(
    actor: ActingUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let approver = actor.require()?;
    let period = service::approve_period(pool.get_ref(), &path.into_inner(), approver).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": period,
        "message": "Payroll period approved successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods/{id}/close",
    params(("id", description = "Payroll period ID")),
    responses(
        (status = 200, description = "Period closed", body = PayPeriod),
        (status = 400, description = "Period is not PAID or has unpaid payslips"),
        (status = 404, description = "Period not found")
    ),
    tag = "Periods"
)]
pub async fn close_period(
    actor: ActingUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let closer = actor.require()?;
    let period = service::close_period(pool.get_ref(), &path.into_inner(), closer).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": period,
        "message": "Payroll period closed successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods/{id}/recalculate",
    params(("id", description = "Payroll period ID")),
    responses(
        (status = 200, description = "Aggregated totals", body = crate::service::pay_period::PeriodTotals),
        (status = 404, description = "Period not found")
    ),
    tag = "Periods"
)]
pub async fn recalculate_period(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let totals = service::recalculate_totals(pool.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": totals,
        "message": "Period totals recalculated"
    })))
}
