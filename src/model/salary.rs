use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::pay_period::PayFrequency;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, strum::Display, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SalaryChangeType {
    Initial,
    Promotion,
    AnnualIncrease,
    MeritIncrease,
    CostOfLiving,
    Demotion,
    Transfer,
    Adjustment,
    Bonus,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, strum::Display, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SalaryStatus {
    Active,
    Inactive,
    Pending,
    Superseded,
}

/// One row of an employee's compensation history. The `allowances` and
/// `benefits` columns hold JSON text; the API layer parses them into maps.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SalaryRecord {
    pub id: String,
    #[schema(example = "EMP001")]
    pub employee_id: String,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub effective_date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,

    #[schema(example = 5000.0)]
    pub base_salary: f64,
    #[schema(example = "USD")]
    pub currency: String,
    pub salary_grade: Option<String>,
    pub pay_frequency: PayFrequency,

    pub allowances: Option<String>,
    pub benefits: Option<String>,

    #[schema(example = "Initial hire")]
    pub change_reason: String,
    pub change_type: SalaryChangeType,

    pub previous_salary: Option<f64>,
    pub salary_increase: Option<f64>,
    pub percentage_increase: Option<f64>,

    pub status: SalaryStatus,
    pub comments: Option<String>,

    pub approved_by: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub approved_date: Option<NaiveDateTime>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}
