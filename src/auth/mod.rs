//! Cookie based authentication for the protected routes.

pub(crate) mod cookie;
mod middleware;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub(crate) use cookie::{get_user_id_from_auth_cookie, invalidate_auth_cookie, set_auth_cookie};
pub use middleware::{AuthState, auth_guard};
