//! Payslip arithmetic. Pure functions over request values; nothing in here
//! touches the database.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::AppError;

pub const INCOME_TAX_RATE: f64 = 0.15;
pub const SOCIAL_SECURITY_RATE: f64 = 0.062;
pub const MEDICARE_RATE: f64 = 0.0145;
pub const STATE_TAX_RATE: f64 = 0.05;
pub const LOCAL_TAX_RATE: f64 = 0.0;

pub const HOURS_PER_DAY: f64 = 8.0;
pub const OVERTIME_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct PayInputs<'a> {
    pub base_salary: f64,
    pub working_days: i64,
    pub actual_working_days: i64,
    pub overtime_hours: f64,
    pub earnings: &'a BTreeMap<String, f64>,
    pub deductions: &'a BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayAmounts {
    pub overtime_rate: f64,
    pub overtime_pay: f64,
    pub total_earnings: f64,
    pub total_deductions: f64,
    pub taxable_income: f64,
    pub income_tax: f64,
    pub social_security_tax: f64,
    pub medicare_tax: f64,
    pub state_tax: f64,
    pub local_tax: f64,
    pub total_taxes: f64,
    pub gross_pay: f64,
    pub net_pay: f64,
}

/// Count of weekdays (Monday through Friday) in the inclusive range.
pub fn working_days(start: NaiveDate, end: NaiveDate) -> i64 {
    let mut count = 0;
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    count
}

/// Earnings/deduction maps come in as free-form JSON objects; every key must
/// be non-empty and every amount a finite, non-negative number before the
/// sums feed into the pay calculation.
pub fn validate_money_map(label: &str, map: &BTreeMap<String, f64>) -> Result<(), AppError> {
    for (key, value) in map {
        if key.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "{} entries must have non-empty labels",
                label
            )));
        }
        if !value.is_finite() || *value < 0.0 {
            return Err(AppError::Validation(format!(
                "{} entry '{}' must be a finite non-negative amount",
                label, key
            )));
        }
    }
    Ok(())
}

pub fn calculate(inputs: &PayInputs) -> Result<PayAmounts, AppError> {
    // A period that contains no weekdays would divide by zero below.
    if inputs.working_days <= 0 {
        return Err(AppError::Validation(
            "Payroll period has no working days".to_string(),
        ));
    }

    let daily_salary = inputs.base_salary / inputs.working_days as f64;
    let actual_base_pay = daily_salary * inputs.actual_working_days as f64;

    let hourly_rate = daily_salary / HOURS_PER_DAY;
    let overtime_rate = hourly_rate * OVERTIME_MULTIPLIER;
    let overtime_pay = inputs.overtime_hours * overtime_rate;

    let additional_earnings: f64 = inputs.earnings.values().sum();
    let total_earnings = actual_base_pay + overtime_pay + additional_earnings;
    let gross_pay = total_earnings;

    let total_deductions: f64 = inputs.deductions.values().sum();
    let taxable_income = gross_pay - total_deductions;

    let income_tax = taxable_income * INCOME_TAX_RATE;
    let social_security_tax = taxable_income * SOCIAL_SECURITY_RATE;
    let medicare_tax = taxable_income * MEDICARE_RATE;
    let state_tax = taxable_income * STATE_TAX_RATE;
    let local_tax = taxable_income * LOCAL_TAX_RATE;
    let total_taxes = income_tax + social_security_tax + medicare_tax + state_tax + local_tax;

    let net_pay = gross_pay - total_deductions - total_taxes;

    Ok(PayAmounts {
        overtime_rate,
        overtime_pay,
        total_earnings,
        total_deductions,
        taxable_income,
        income_tax,
        social_security_tax,
        medicare_tax,
        state_tax,
        local_tax,
        total_taxes,
        gross_pay,
        net_pay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn january_2024_has_23_weekdays() {
        assert_eq!(working_days(date(2024, 1, 1), date(2024, 1, 31)), 23);
    }

    #[test]
    fn weekend_only_range_has_no_working_days() {
        // 2024-01-06/07 is a Saturday/Sunday pair
        assert_eq!(working_days(date(2024, 1, 6), date(2024, 1, 7)), 0);
    }

    #[test]
    fn single_week_has_five_working_days() {
        assert_eq!(working_days(date(2024, 1, 8), date(2024, 1, 14)), 5);
    }

    #[test]
    fn full_calculation_matches_formula_set() {
        let earnings = map(&[("bonus", 500.0)]);
        let deductions = map(&[("insurance", 200.0)]);
        let amounts = calculate(&PayInputs {
            base_salary: 5000.0,
            working_days: 22,
            actual_working_days: 22,
            overtime_hours: 5.0,
            earnings: &earnings,
            deductions: &deductions,
        })
        .unwrap();

        let daily = 5000.0 / 22.0;
        assert!((amounts.overtime_rate - daily / 8.0 * 1.5).abs() < 1e-9);
        assert!((amounts.overtime_pay - 213.068_181_818).abs() < 1e-6);
        assert!((amounts.gross_pay - 5713.068_181_818).abs() < 1e-6);
        assert!((amounts.total_deductions - 200.0).abs() < 1e-9);
        assert!((amounts.taxable_income - 5513.068_181_818).abs() < 1e-6);

        let expected_taxes = amounts.taxable_income * (0.15 + 0.062 + 0.0145 + 0.05);
        assert!((amounts.total_taxes - expected_taxes).abs() < 1e-9);
        assert!(
            (amounts.net_pay
                - (amounts.gross_pay - amounts.total_deductions - amounts.total_taxes))
                .abs()
                < 1e-9
        );
        assert_eq!(amounts.local_tax, 0.0);
    }

    #[test]
    fn full_attendance_without_extras_grosses_base_salary() {
        let empty = BTreeMap::new();
        let amounts = calculate(&PayInputs {
            base_salary: 4600.0,
            working_days: 23,
            actual_working_days: 23,
            overtime_hours: 0.0,
            earnings: &empty,
            deductions: &empty,
        })
        .unwrap();

        assert!((amounts.gross_pay - 4600.0).abs() < 1e-6);
        assert!(amounts.net_pay < amounts.gross_pay);
    }

    #[test]
    fn zero_working_days_is_rejected() {
        let empty = BTreeMap::new();
        let err = calculate(&PayInputs {
            base_salary: 5000.0,
            working_days: 0,
            actual_working_days: 0,
            overtime_hours: 0.0,
            earnings: &empty,
            deductions: &empty,
        })
        .unwrap_err();
        assert!(err.to_string().contains("no working days"));
    }

    #[test]
    fn money_maps_reject_bad_entries() {
        assert!(validate_money_map("earnings", &map(&[("bonus", 500.0)])).is_ok());
        assert!(validate_money_map("earnings", &map(&[(" ", 1.0)])).is_err());
        assert!(validate_money_map("deductions", &map(&[("tax", -1.0)])).is_err());
        assert!(validate_money_map("deductions", &map(&[("tax", f64::NAN)])).is_err());
        assert!(validate_money_map("earnings", &map(&[("x", f64::INFINITY)])).is_err());
    }
}
