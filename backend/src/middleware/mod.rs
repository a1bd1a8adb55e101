pub mod auth;
pub mod logging;
pub mod rate_limit;
pub mod request_id;
pub mod tenant;

pub use auth::*;
pub use logging::*;
pub use request_id::*;
pub use tenant::{tenant, OrgContext, ORGANIZATION_HEADER};
