mod common;

use std::collections::BTreeMap;

use common::*;
use hrm_payroll::api::payslip::{BulkPayslipRequest, UpdatePayslipRequest};
use hrm_payroll::error::AppError;
use hrm_payroll::model::pay_period::PeriodStatus;
use hrm_payroll::model::payslip::PayslipStatus;
use hrm_payroll::model::salary::SalaryChangeType;
use hrm_payroll::service::{pay_period, payslip, salary};

fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[actix_web::test]
async fn payslip_is_computed_from_the_ledger() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();
    salary::create_salary_record(
        &pool,
        &salary_request("EMP001", 5000.0, date(2024, 1, 1), SalaryChangeType::Initial),
        None,
    )
    .await
    .unwrap();

    let slip = payslip::create_payslip(&pool, &payslip_request("EMP001", &period.id), Some("hr-1"))
        .await
        .unwrap();

    // January 2024 has 23 weekdays
    assert_eq!(slip.working_days, 23);
    assert_eq!(slip.actual_working_days, 23);
    assert_eq!(slip.status, PayslipStatus::Generated);
    assert!((slip.gross_pay - 5000.0).abs() < 1e-6);
    assert!((slip.taxable_income - 5000.0).abs() < 1e-6);
    assert!((slip.total_taxes - 5000.0 * (0.15 + 0.062 + 0.0145 + 0.05)).abs() < 1e-6);
    assert!((slip.net_pay - (slip.gross_pay - slip.total_taxes)).abs() < 1e-9);
    assert!(slip.net_pay < slip.gross_pay);

    // totals are rolled up onto the owning period
    let period = pay_period::fetch_period(&pool, &period.id).await.unwrap();
    assert_eq!(period.total_employees, 1);
    assert!((period.total_gross_pay - slip.gross_pay).abs() < 1e-9);
    assert!((period.total_net_pay - slip.net_pay).abs() < 1e-9);
}

#[actix_web::test]
async fn overtime_and_extras_follow_the_formula() {
    let pool = setup_pool().await;
    // April 2024 has 22 weekdays
    let period = pay_period::create_period(
        &pool,
        &period_request(
            "April 2024",
            date(2024, 4, 1),
            date(2024, 4, 30),
            date(2024, 5, 5),
        ),
        None,
    )
    .await
    .unwrap();
    salary::create_salary_record(
        &pool,
        &salary_request("EMP001", 5000.0, date(2024, 1, 1), SalaryChangeType::Initial),
        None,
    )
    .await
    .unwrap();

    let mut req = payslip_request("EMP001", &period.id);
    req.overtime_hours = Some(5.0);
    req.earnings = Some(map(&[("bonus", 500.0)]));
    req.deductions = Some(map(&[("insurance", 200.0)]));
    let slip = payslip::create_payslip(&pool, &req, None).await.unwrap();

    let daily = 5000.0 / 22.0;
    assert!((slip.overtime_rate - daily / 8.0 * 1.5).abs() < 1e-9);
    assert!((slip.gross_pay - 5713.068_181_818).abs() < 1e-6);
    assert!((slip.taxable_income - 5513.068_181_818).abs() < 1e-6);
    let expected_taxes = slip.taxable_income * (0.15 + 0.062 + 0.0145 + 0.05);
    assert!((slip.total_taxes - expected_taxes).abs() < 1e-6);
    assert!(
        (slip.net_pay - (slip.gross_pay - slip.total_deductions - slip.total_taxes)).abs() < 1e-9
    );
}

#[actix_web::test]
async fn duplicate_payslip_is_a_conflict() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();
    salary::create_salary_record(
        &pool,
        &salary_request("EMP001", 5000.0, date(2024, 1, 1), SalaryChangeType::Initial),
        None,
    )
    .await
    .unwrap();

    payslip::create_payslip(&pool, &payslip_request("EMP001", &period.id), None)
        .await
        .unwrap();
    let err = payslip::create_payslip(&pool, &payslip_request("EMP001", &period.id), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[actix_web::test]
async fn missing_salary_record_fails_validation() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();

    let err = payslip::create_payslip(&pool, &payslip_request("EMP404", &period.id), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[actix_web::test]
async fn weekend_only_period_cannot_generate_payslips() {
    let pool = setup_pool().await;
    // 2024-01-06/07 is a Saturday/Sunday pair
    let period = pay_period::create_period(
        &pool,
        &period_request(
            "Weekend run",
            date(2024, 1, 6),
            date(2024, 1, 7),
            date(2024, 1, 8),
        ),
        None,
    )
    .await
    .unwrap();
    salary::create_salary_record(
        &pool,
        &salary_request("EMP001", 5000.0, date(2024, 1, 1), SalaryChangeType::Initial),
        None,
    )
    .await
    .unwrap();

    let err = payslip::create_payslip(&pool, &payslip_request("EMP001", &period.id), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[actix_web::test]
async fn bulk_creation_isolates_failures_in_order() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();
    for employee in ["EMP001", "EMP003"] {
        salary::create_salary_record(
            &pool,
            &salary_request(employee, 5000.0, date(2024, 1, 1), SalaryChangeType::Initial),
            None,
        )
        .await
        .unwrap();
    }

    let result = payslip::bulk_create_payslips(
        &pool,
        &BulkPayslipRequest {
            payroll_period_id: period.id.clone(),
            employee_ids: vec![
                "EMP001".to_string(),
                "EMP002".to_string(),
                "EMP003".to_string(),
            ],
        },
        None,
    )
    .await
    .unwrap();

    assert_eq!(result.successful.len(), 2);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].employee_id, "EMP002");
    assert!(result.failed[0].error.contains("No active salary record"));

    let period = pay_period::fetch_period(&pool, &period.id).await.unwrap();
    assert_eq!(period.total_employees, 2);
}

#[actix_web::test]
async fn bulk_creation_requires_an_existing_period() {
    let pool = setup_pool().await;
    let err = payslip::bulk_create_payslips(
        &pool,
        &BulkPayslipRequest {
            payroll_period_id: "nope".to_string(),
            employee_ids: vec!["EMP001".to_string()],
        },
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_web::test]
async fn updating_extras_recalculates_the_totals() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();
    salary::create_salary_record(
        &pool,
        &salary_request("EMP001", 5000.0, date(2024, 1, 1), SalaryChangeType::Initial),
        None,
    )
    .await
    .unwrap();
    let slip = payslip::create_payslip(&pool, &payslip_request("EMP001", &period.id), None)
        .await
        .unwrap();

    let update = UpdatePayslipRequest {
        overtime_hours: None,
        earnings: Some(map(&[("bonus", 500.0)])),
        deductions: None,
        status: None,
        notes: None,
    };
    let updated = payslip::update_payslip(&pool, &slip.id, &update, None)
        .await
        .unwrap();

    assert!((updated.gross_pay - (slip.gross_pay + 500.0)).abs() < 1e-6);
    assert!(updated.total_taxes > slip.total_taxes);

    let period = pay_period::fetch_period(&pool, &period.id).await.unwrap();
    assert!((period.total_gross_pay - updated.gross_pay).abs() < 1e-9);
}

#[actix_web::test]
async fn paid_payslips_are_immutable() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();
    salary::create_salary_record(
        &pool,
        &salary_request("EMP001", 5000.0, date(2024, 1, 1), SalaryChangeType::Initial),
        None,
    )
    .await
    .unwrap();
    let slip = payslip::create_payslip(&pool, &payslip_request("EMP001", &period.id), None)
        .await
        .unwrap();

    let mark_paid = UpdatePayslipRequest {
        overtime_hours: None,
        earnings: None,
        deductions: None,
        status: Some(PayslipStatus::Paid),
        notes: None,
    };
    payslip::update_payslip(&pool, &slip.id, &mark_paid, None)
        .await
        .unwrap();

    let touch = UpdatePayslipRequest {
        overtime_hours: Some(1.0),
        earnings: None,
        deductions: None,
        status: None,
        notes: None,
    };
    assert!(matches!(
        payslip::update_payslip(&pool, &slip.id, &touch, None)
            .await
            .unwrap_err(),
        AppError::IllegalState(_)
    ));
    assert!(matches!(
        payslip::delete_payslip(&pool, &slip.id).await.unwrap_err(),
        AppError::IllegalState(_)
    ));
}

#[actix_web::test]
async fn close_waits_for_every_payslip_to_be_paid() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();
    salary::create_salary_record(
        &pool,
        &salary_request("EMP001", 5000.0, date(2024, 1, 1), SalaryChangeType::Initial),
        None,
    )
    .await
    .unwrap();
    let slip = payslip::create_payslip(&pool, &payslip_request("EMP001", &period.id), None)
        .await
        .unwrap();

    pay_period::update_period(&pool, &period.id, &status_update(PeriodStatus::Paid), None)
        .await
        .unwrap();

    let err = pay_period::close_period(&pool, &period.id, "mgr-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IllegalState(_)));

    let mark_paid = UpdatePayslipRequest {
        overtime_hours: None,
        earnings: None,
        deductions: None,
        status: Some(PayslipStatus::Paid),
        notes: None,
    };
    payslip::update_payslip(&pool, &slip.id, &mark_paid, None)
        .await
        .unwrap();

    let closed = pay_period::close_period(&pool, &period.id, "mgr-1")
        .await
        .unwrap();
    assert_eq!(closed.status, PeriodStatus::Closed);
}

#[actix_web::test]
async fn period_with_payslips_cannot_be_deleted() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();
    salary::create_salary_record(
        &pool,
        &salary_request("EMP001", 5000.0, date(2024, 1, 1), SalaryChangeType::Initial),
        None,
    )
    .await
    .unwrap();
    let slip = payslip::create_payslip(&pool, &payslip_request("EMP001", &period.id), None)
        .await
        .unwrap();

    let err = pay_period::delete_period(&pool, &period.id).await.unwrap_err();
    assert!(matches!(err, AppError::IllegalState(_)));

    // deleting the payslip unblocks the period and refreshes its totals
    payslip::delete_payslip(&pool, &slip.id).await.unwrap();
    let refreshed = pay_period::fetch_period(&pool, &period.id).await.unwrap();
    assert_eq!(refreshed.total_employees, 0);
    pay_period::delete_period(&pool, &period.id).await.unwrap();
}
