mod common;

use common::*;
use hrm_payroll::api::pay_period::PeriodQuery;
use hrm_payroll::error::AppError;
use hrm_payroll::model::pay_period::PeriodStatus;
use hrm_payroll::service::pay_period;

fn all_periods_query() -> PeriodQuery {
    PeriodQuery {
        page: None,
        limit: None,
        search: None,
        status: None,
        frequency: None,
        start_date: None,
        end_date: None,
        year: None,
        month: None,
    }
}

#[actix_web::test]
async fn overlapping_period_is_rejected() {
    let pool = setup_pool().await;
    pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();

    let overlapping = period_request(
        "Mid January",
        date(2024, 1, 15),
        date(2024, 2, 14),
        date(2024, 2, 20),
    );
    let err = pay_period::create_period(&pool, &overlapping, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[actix_web::test]
async fn adjacent_periods_do_not_conflict() {
    let pool = setup_pool().await;
    pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();

    let february = period_request(
        "February 2024",
        date(2024, 2, 1),
        date(2024, 2, 29),
        date(2024, 3, 5),
    );
    assert!(pay_period::create_period(&pool, &february, None).await.is_ok());
}

#[actix_web::test]
async fn cancelled_periods_free_their_dates() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();
    pay_period::update_period(&pool, &period.id, &status_update(PeriodStatus::Cancelled), None)
        .await
        .unwrap();

    let replacement = period_request(
        "January 2024 rerun",
        date(2024, 1, 1),
        date(2024, 1, 31),
        date(2024, 2, 5),
    );
    assert!(
        pay_period::create_period(&pool, &replacement, None)
            .await
            .is_ok()
    );
}

#[actix_web::test]
async fn invalid_dates_are_rejected() {
    let pool = setup_pool().await;

    let backwards = period_request(
        "Backwards",
        date(2024, 1, 31),
        date(2024, 1, 1),
        date(2024, 2, 5),
    );
    assert!(matches!(
        pay_period::create_period(&pool, &backwards, None)
            .await
            .unwrap_err(),
        AppError::Validation(_)
    ));

    let early_pay = period_request(
        "Early pay",
        date(2024, 1, 1),
        date(2024, 1, 31),
        date(2024, 1, 20),
    );
    assert!(matches!(
        pay_period::create_period(&pool, &early_pay, None)
            .await
            .unwrap_err(),
        AppError::Validation(_)
    ));
}

#[actix_web::test]
async fn status_never_retreats() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();

    let period =
        pay_period::update_period(&pool, &period.id, &status_update(PeriodStatus::Processed), None)
            .await
            .unwrap();
    assert_eq!(period.status, PeriodStatus::Processed);

    let err =
        pay_period::update_period(&pool, &period.id, &status_update(PeriodStatus::Draft), None)
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::IllegalState(_)));
}

#[actix_web::test]
async fn approve_requires_processed_status() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();

    let err = pay_period::approve_period(&pool, &period.id, "mgr-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IllegalState(_)));

    pay_period::update_period(&pool, &period.id, &status_update(PeriodStatus::Processed), None)
        .await
        .unwrap();
    let period = pay_period::approve_period(&pool, &period.id, "mgr-1")
        .await
        .unwrap();
    assert_eq!(period.status, PeriodStatus::Approved);
    assert_eq!(period.approved_by.as_deref(), Some("mgr-1"));
    assert!(period.approved_date.is_some());
}

#[actix_web::test]
async fn closed_period_rejects_further_updates() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();

    pay_period::update_period(&pool, &period.id, &status_update(PeriodStatus::Paid), None)
        .await
        .unwrap();
    let period = pay_period::close_period(&pool, &period.id, "mgr-1")
        .await
        .unwrap();
    assert_eq!(period.status, PeriodStatus::Closed);
    assert_eq!(period.closed_by.as_deref(), Some("mgr-1"));

    let err =
        pay_period::update_period(&pool, &period.id, &status_update(PeriodStatus::Cancelled), None)
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::IllegalState(_)));
}

#[actix_web::test]
async fn close_requires_paid_status() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();

    let err = pay_period::close_period(&pool, &period.id, "mgr-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IllegalState(_)));
}

#[actix_web::test]
async fn month_filter_narrows_the_list() {
    let pool = setup_pool().await;
    pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();
    let march = period_request(
        "March 2024",
        date(2024, 3, 1),
        date(2024, 3, 31),
        date(2024, 4, 5),
    );
    pay_period::create_period(&pool, &march, None)
        .await
        .unwrap();

    let (all, total) = pay_period::list_periods(&pool, &all_periods_query())
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(all.len(), 2);

    let mut query = all_periods_query();
    query.year = Some(2024);
    query.month = Some(3);
    let (march_only, total) = pay_period::list_periods(&pool, &query).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(march_only[0].name, "March 2024");
}

#[actix_web::test]
async fn recalculating_an_empty_period_zeroes_the_totals() {
    let pool = setup_pool().await;
    let period = pay_period::create_period(&pool, &january_2024(), None)
        .await
        .unwrap();

    let totals = pay_period::recalculate_totals(&pool, &period.id)
        .await
        .unwrap();
    assert_eq!(totals.total_employees, 0);
    assert_eq!(totals.total_gross_pay, 0.0);
    assert_eq!(totals.total_deductions, 0.0);
    assert_eq!(totals.total_net_pay, 0.0);

    let period = pay_period::fetch_period(&pool, &period.id).await.unwrap();
    assert_eq!(period.total_employees, 0);
    assert_eq!(period.total_gross_pay, 0.0);
}

#[actix_web::test]
async fn deleting_a_missing_period_is_not_found() {
    let pool = setup_pool().await;
    let err = pay_period::delete_period(&pool, "nope").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
