//! Multi-tenant human resources backend: employees, attendance, vacations,
//! payroll with DIAN electronic documents, talent management and
//! disciplinary processes.

pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod router;
pub mod services;
pub mod state;
pub mod types;
pub mod utils;
pub mod validation;
