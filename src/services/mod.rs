//! Business logic services

pub mod loan_service;
pub mod profile_service;
pub mod underwriting;

pub use loan_service::{apply_update, LoanService};
pub use profile_service::ProfileService;
