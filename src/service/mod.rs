pub mod calc;
pub mod pay_period;
pub mod payslip;
pub mod salary;
