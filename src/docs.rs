use crate::api::pay_period::{CreatePeriodRequest, PeriodListResponse, UpdatePeriodRequest};
use crate::api::payslip::{
    BulkPayslipRequest, CreatePayslipRequest, EmployeeSnapshot, PayslipListResponse,
    UpdatePayslipRequest,
};
use crate::api::salary::{CreateSalaryRequest, SalaryHistoryResponse, UpdateSalaryRequest};
use crate::model::pay_period::{PayFrequency, PayPeriod, PeriodStatus};
use crate::model::payslip::{Payslip, PayslipStatus};
use crate::model::salary::{SalaryChangeType, SalaryRecord, SalaryStatus};
use crate::models::Pagination;
use crate::service::pay_period::{PayslipSummary, PeriodTotals};
use crate::service::payslip::{BulkFailure, BulkResult, PeriodRef};
use crate::service::salary::{GradeStats, SalaryStatistics, TrendBucket};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Payroll Service API",
        version = "1.0.0",
        description = r#"
## Payroll Service

Payroll microservice of the HRM suite: pay periods, salary history and
payslip generation.

### 🔹 Key Features
- **Pay Periods**
  - Non-overlapping period calendar with a forward-only lifecycle
- **Salary Ledger**
  - Append-only compensation history with automatic supersession
- **Payslips**
  - Deterministic gross/tax/net computation, single or in bulk

### 📦 Response Format
- JSON-based RESTful responses in a `{success, data, message}` envelope
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::pay_period::create_period,
        crate::api::pay_period::list_periods,
        crate::api::pay_period::get_period,
        crate::api::pay_period::update_period,
        crate::api::pay_period::delete_period,
        crate::api::pay_period::approve_period,
        crate::api::pay_period::close_period,
        crate::api::pay_period::recalculate_period,

        crate::api::payslip::create_payslip,
        crate::api::payslip::list_payslips,
        crate::api::payslip::get_payslip,
        crate::api::payslip::update_payslip,
        crate::api::payslip::delete_payslip,
        crate::api::payslip::bulk_create_payslips,

        crate::api::salary::create_salary,
        crate::api::salary::salary_history,
        crate::api::salary::employee_salary_history,
        crate::api::salary::current_salary,
        crate::api::salary::update_salary,
        crate::api::salary::approve_salary,
        crate::api::salary::salary_statistics,
        crate::api::salary::salary_trends
    ),
    components(
        schemas(
            PayFrequency,
            PeriodStatus,
            SalaryChangeType,
            SalaryStatus,
            PayslipStatus,
            PayPeriod,
            SalaryRecord,
            Payslip,
            Pagination,
            CreatePeriodRequest,
            UpdatePeriodRequest,
            PeriodListResponse,
            PayslipSummary,
            PeriodTotals,
            CreateSalaryRequest,
            UpdateSalaryRequest,
            SalaryHistoryResponse,
            SalaryStatistics,
            GradeStats,
            TrendBucket,
            CreatePayslipRequest,
            UpdatePayslipRequest,
            BulkPayslipRequest,
            EmployeeSnapshot,
            PayslipListResponse,
            PeriodRef,
            BulkFailure,
            BulkResult
        )
    ),
    tags(
        (name = "Periods", description = "Pay period management APIs"),
        (name = "Salary", description = "Salary ledger APIs"),
        (name = "Payslips", description = "Payslip generation APIs"),
    )
)]
pub struct ApiDoc;
