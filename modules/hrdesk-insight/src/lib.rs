//! Selector chains of the HR front-end bound to the HR REST API.

pub mod cli;
pub mod drive;
pub mod insight;
pub mod payroll;
pub mod report;

pub use drive::walk;
pub use insight::InsightSource;
pub use payroll::PayrollSource;
