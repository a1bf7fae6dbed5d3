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
pub enum PayFrequency {
    Weekly,
    BiWeekly,
    SemiMonthly,
    Monthly,
    Quarterly,
    Annually,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, strum::Display, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    Draft,
    InProgress,
    Processed,
    Approved,
    Paid,
    Closed,
    Cancelled,
}

impl PeriodStatus {
    /// Position in the forward-only lifecycle. CANCELLED sits outside the
    /// ordering and is handled separately.
    fn rank(self) -> Option<u8> {
        match self {
            PeriodStatus::Draft => Some(0),
            PeriodStatus::InProgress => Some(1),
            PeriodStatus::Processed => Some(2),
            PeriodStatus::Approved => Some(3),
            PeriodStatus::Paid => Some(4),
            PeriodStatus::Closed => Some(5),
            PeriodStatus::Cancelled => None,
        }
    }

    /// A period never retreats; CANCELLED is reachable from every state
    /// except CLOSED.
    pub fn can_transition_to(self, next: PeriodStatus) -> bool {
        if self == next {
            return true;
        }
        match (self.rank(), next.rank()) {
            (Some(_), None) => self != PeriodStatus::Closed,
            (Some(from), Some(to)) => to > from,
            (None, _) => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PayPeriod {
    #[schema(example = "c5b9f6e0-0000-4000-8000-000000000001")]
    pub id: String,

    #[schema(example = "January 2024")]
    pub name: String,
    pub description: Option<String>,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-31", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = "2024-02-05", value_type = String, format = "date")]
    pub pay_date: NaiveDate,

    pub frequency: PayFrequency,
    #[schema(example = "USD")]
    pub currency: String,
    pub status: PeriodStatus,

    pub total_employees: i64,
    pub total_gross_pay: f64,
    pub total_deductions: f64,
    pub total_net_pay: f64,

    pub processing_notes: Option<String>,
    pub approved_by: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub approved_date: Option<NaiveDateTime>,
    pub closed_by: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub closed_date: Option<NaiveDateTime>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}
