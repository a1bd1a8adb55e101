//! Domain logic that does not belong to a single handler.

pub mod attendance;
pub mod dian;
pub mod payroll;
pub mod psychometric;
