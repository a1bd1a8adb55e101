pub mod csv;
pub mod jwt;
pub mod numbers;
pub mod password;
pub mod time;
