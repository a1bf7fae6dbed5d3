use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, strum::Display, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PayslipStatus {
    Generated,
    Reviewed,
    Approved,
    Paid,
    Void,
    Error,
}

impl PayslipStatus {
    fn rank(self) -> Option<u8> {
        match self {
            PayslipStatus::Generated => Some(0),
            PayslipStatus::Reviewed => Some(1),
            PayslipStatus::Approved => Some(2),
            PayslipStatus::Paid => Some(3),
            // terminal/diagnostic states outside the happy path
            PayslipStatus::Void | PayslipStatus::Error => None,
        }
    }

    /// Forward through GENERATED -> REVIEWED -> APPROVED -> PAID; VOID and
    /// ERROR are reachable from any non-PAID state. PAID is immutable and
    /// checked before this is ever consulted.
    pub fn can_transition_to(self, next: PayslipStatus) -> bool {
        if self == next {
            return true;
        }
        match (self.rank(), next.rank()) {
            (Some(_), None) => true,
            (Some(from), Some(to)) => to > from,
            (None, _) => false,
        }
    }
}

/// The computed compensation statement for one employee in one pay period.
/// `earnings` and `deductions` are JSON text columns parsed by the API layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payslip {
    pub id: String,
    #[schema(example = "EMP001")]
    pub employee_id: String,
    pub payroll_period_id: String,

    // employee snapshot stamped at creation time
    pub employee_number: String,
    pub full_name: String,
    pub designation: String,
    pub department: String,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub pay_period_start: NaiveDate,
    #[schema(example = "2024-01-31", value_type = String, format = "date")]
    pub pay_period_end: NaiveDate,
    #[schema(example = "2024-02-05", value_type = String, format = "date")]
    pub pay_date: NaiveDate,

    pub working_days: i64,
    pub actual_working_days: i64,

    #[schema(example = 5000.0)]
    pub base_salary: f64,
    pub overtime_hours: f64,
    pub overtime_rate: f64,
    pub overtime_pay: f64,

    pub earnings: Option<String>,
    pub total_earnings: f64,
    pub deductions: Option<String>,
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

    #[schema(example = "USD")]
    pub currency: String,
    pub status: PayslipStatus,
    #[schema(example = "BANK_TRANSFER")]
    pub payment_method: String,
    pub notes: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}
