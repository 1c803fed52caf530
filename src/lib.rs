//! MicroLend Backend Library
//!
//! Loan-origination backend: account management, applicant profiles, and a
//! deterministic underwriting engine (EMI calculator, risk scorer, decision
//! policy) behind a JSON HTTP API.

pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
