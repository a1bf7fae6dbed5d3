#![allow(dead_code)]

use chrono::NaiveDate;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use hrm_payroll::api::pay_period::{CreatePeriodRequest, UpdatePeriodRequest};
use hrm_payroll::api::payslip::CreatePayslipRequest;
use hrm_payroll::api::salary::CreateSalaryRequest;
use hrm_payroll::model::pay_period::PeriodStatus;
use hrm_payroll::model::salary::SalaryChangeType;

/// Fresh in-memory database per test. A single connection keeps every
/// query on the same in-memory instance.
pub async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn period_request(
    name: &str,
    start: NaiveDate,
    end: NaiveDate,
    pay: NaiveDate,
) -> CreatePeriodRequest {
    CreatePeriodRequest {
        name: name.to_string(),
        description: None,
        start_date: start,
        end_date: end,
        pay_date: pay,
        frequency: None,
        currency: None,
    }
}

pub fn january_2024() -> CreatePeriodRequest {
    period_request(
        "January 2024",
        date(2024, 1, 1),
        date(2024, 1, 31),
        date(2024, 2, 5),
    )
}

pub fn status_update(status: PeriodStatus) -> UpdatePeriodRequest {
    UpdatePeriodRequest {
        name: None,
        description: None,
        start_date: None,
        end_date: None,
        pay_date: None,
        status: Some(status),
        processing_notes: None,
    }
}

pub fn salary_request(
    employee_id: &str,
    base_salary: f64,
    effective_date: NaiveDate,
    change_type: SalaryChangeType,
) -> CreateSalaryRequest {
    CreateSalaryRequest {
        employee_id: employee_id.to_string(),
        base_salary,
        effective_date,
        change_reason: "test change".to_string(),
        change_type,
        salary_grade: None,
        pay_frequency: None,
        currency: None,
        allowances: None,
        benefits: None,
        comments: None,
        status: None,
    }
}

pub fn payslip_request(employee_id: &str, period_id: &str) -> CreatePayslipRequest {
    CreatePayslipRequest {
        employee_id: employee_id.to_string(),
        payroll_period_id: period_id.to_string(),
        overtime_hours: None,
        actual_working_days: None,
        earnings: None,
        deductions: None,
        employee: None,
    }
}
