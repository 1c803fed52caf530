//! HTTP request handlers

pub mod auth;
pub mod loan;
pub mod profile;
