//! Access control: a shared password unlocks a cookie session.

pub mod middleware;

pub use middleware::{check_access, AuthRejection, Authorized, COOKIES_PAGE, PASSWORD_PARAM};
