pub mod admin;
pub mod attendance;
pub mod auth;
pub mod benefits;
pub mod common;
pub mod competencies;
pub mod departments;
pub mod dian;
pub mod disciplinary;
pub mod employees;
pub mod evaluations;
pub mod organizations;
pub mod payroll;
pub mod positions;
pub mod training;
pub mod vacations;
