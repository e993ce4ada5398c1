//! The application's route URIs.
//!
//! For endpoints that take a parameter, e.g., '/expenses/{expense_id}/', use
//! [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The registration form.
pub const REGISTER: &str = "/accounts/register/";
/// The log in form.
pub const LOG_IN: &str = "/accounts/login/";
/// The route that terminates the current session.
pub const LOG_OUT: &str = "/accounts/logout/";
/// The landing page for logged in users: monthly total, count and recent expenses.
pub const DASHBOARD: &str = "/expenses/";
/// The JSON stats for the dashboard.
pub const DASHBOARD_STATS: &str = "/expenses/stats/";
/// The page listing a user's expenses with optional category/search filters.
pub const EXPENSE_LIST: &str = "/expenses/list/";
/// The page and endpoint for creating a new expense.
pub const CREATE_EXPENSE: &str = "/expenses/create/";
/// The page showing a single expense.
pub const EXPENSE_DETAIL: &str = "/expenses/{expense_id}/";
/// The page and endpoint for editing an existing expense.
pub const EDIT_EXPENSE: &str = "/expenses/{expense_id}/edit/";
/// The confirmation page and endpoint for deleting an expense.
pub const DELETE_EXPENSE: &str = "/expenses/{expense_id}/delete/";
/// The route for static files.
pub const STATIC: &str = "/static";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/expenses/{expense_id}/',
/// '{expense_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
