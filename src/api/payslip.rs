use std::collections::BTreeMap;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::actor::ActingUser;
use crate::error::AppError;
use crate::model::payslip::{Payslip, PayslipStatus};
use crate::models::{Pagination, page_params, parse_json_column};
use crate::service::payslip as service;

/// Identity fields normally supplied by the employee directory; callers may
/// pass them through so the payslip carries a faithful snapshot.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EmployeeSnapshot {
    #[schema(example = "EMP001")]
    pub employee_number: Option<String>,
    #[schema(example = "John Doe")]
    pub full_name: Option<String>,
    #[schema(example = "Software Engineer")]
    pub designation: Option<String>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePayslipRequest {
    #[schema(example = "EMP001")]
    pub employee_id: String,
    pub payroll_period_id: String,

    #[schema(example = 5.0)]
    pub overtime_hours: Option<f64>,
    /// Defaults to every working day in the period
    pub actual_working_days: Option<i64>,

    #[schema(value_type = Option<Object>, example = json!({"bonus": 500.0}))]
    pub earnings: Option<BTreeMap<String, f64>>,
    #[schema(value_type = Option<Object>, example = json!({"insurance": 200.0}))]
    pub deductions: Option<BTreeMap<String, f64>>,

    pub employee: Option<EmployeeSnapshot>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePayslipRequest {
    pub overtime_hours: Option<f64>,
    #[schema(value_type = Option<Object>)]
    pub earnings: Option<BTreeMap<String, f64>>,
    #[schema(value_type = Option<Object>)]
    pub deductions: Option<BTreeMap<String, f64>>,
    pub status: Option<PayslipStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkPayslipRequest {
    pub payroll_period_id: String,
    #[schema(example = json!(["EMP001", "EMP002"]))]
    pub employee_ids: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PayslipQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Matches name, employee number and designation
    pub search: Option<String>,
    pub employee_id: Option<String>,
    pub payroll_period_id: Option<String>,
    pub status: Option<PayslipStatus>,
    pub department: Option<String>,
    /// Lower bound on period start date
    #[param(value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    /// Upper bound on period start date
    #[param(value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PayslipListResponse {
    #[schema(value_type = Vec<Payslip>)]
    pub payslips: Vec<Value>,
    pub pagination: Pagination,
}

fn payslip_json(payslip: &Payslip) -> Value {
    let mut value = serde_json::to_value(payslip).unwrap_or(Value::Null);
    if let Value::Object(fields) = &mut value {
        fields.insert(
            "earnings".to_string(),
            parse_json_column(payslip.earnings.as_deref()),
        );
        fields.insert(
            "deductions".to_string(),
            parse_json_column(payslip.deductions.as_deref()),
        );
    }
    value
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll/payslips",
    request_body = CreatePayslipRequest,
    responses(
        (status = 201, description = "Payslip created", body = Payslip),
        (status = 400, description = "No active salary record or invalid amounts"),
        (status = 404, description = "Period not found"),
        (status = 409, description = "Payslip already exists for this employee and period")
    ),
    tag = "Payslips"
)]
pub async fn create_payslip(
    actor: ActingUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreatePayslipRequest>,
) -> Result<HttpResponse, AppError> {
    let payslip = service::create_payslip(pool.get_ref(), &payload, actor.id()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "data": payslip_json(&payslip),
        "message": "Payslip created successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/payslips",
    params(PayslipQuery),
    responses(
        (status = 200, description = "Paginated payslip list", body = PayslipListResponse)
    ),
    tag = "Payslips"
)]
pub async fn list_payslips(
    pool: web::Data<SqlitePool>,
    query: web::Query<PayslipQuery>,
) -> Result<HttpResponse, AppError> {
    let (payslips, total) = service::list_payslips(pool.get_ref(), &query).await?;
    let (page, limit, _) = page_params(query.page, query.limit);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": PayslipListResponse {
            payslips: payslips.iter().map(payslip_json).collect(),
            pagination: Pagination::new(page, limit, total),
        }
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/payslips/{id}",
    params(("id", description = "Payslip ID")),
    responses(
        (status = 200, description = "Payslip with owning period"),
        (status = 404, description = "Payslip not found")
    ),
    tag = "Payslips"
)]
pub async fn get_payslip(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let (payslip, period) = service::get_payslip(pool.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": { "payslip": payslip_json(&payslip), "payroll_period": period }
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/payroll/payslips/{id}",
    request_body = UpdatePayslipRequest,
    params(("id", description = "Payslip ID")),
    responses(
        (status = 200, description = "Payslip updated", body = Payslip),
        (status = 400, description = "Payslip is PAID or transition illegal"),
        (status = 404, description = "Payslip not found")
    ),
    tag = "Payslips"
)]
pub async fn update_payslip(
    actor: ActingUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    payload: web::Json<UpdatePayslipRequest>,
) -> Result<HttpResponse, AppError> {
    let payslip =
        service::update_payslip(pool.get_ref(), &path.into_inner(), &payload, actor.id()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": payslip_json(&payslip),
        "message": "Payslip updated successfully"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/payroll/payslips/{id}",
    params(("id", description = "Payslip ID")),
    responses(
        (status = 200, description = "Payslip deleted"),
        (status = 400, description = "Payslip is PAID"),
        (status = 404, description = "Payslip not found")
    ),
    tag = "Payslips"
)]
pub async fn delete_payslip(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    service::delete_payslip(pool.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Payslip deleted successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll/payslips/bulk",
    request_body = BulkPayslipRequest,
    responses(
        (status = 200, description = "Per-employee outcome lists",
         body = crate::service::payslip::BulkResult),
        (status = 404, description = "Period not found")
    ),
    tag = "Payslips"
)]
pub async fn bulk_create_payslips(
    actor: ActingUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<BulkPayslipRequest>,
) -> Result<HttpResponse, AppError> {
    let result = service::bulk_create_payslips(pool.get_ref(), &payload, actor.id()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": result,
        "message": "Bulk payslip creation completed"
    })))
}
