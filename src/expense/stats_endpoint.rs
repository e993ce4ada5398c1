//! A small JSON endpoint the dashboard polls to refresh its summary cards
//! without reloading the page.

use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    Error,
    expense::{ExpenseState, count_expenses, monthly_total},
    user::UserID,
};

/// Return the user's spending total for the current calendar month and their
/// all-time expense count.
pub async fn get_dashboard_stats(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let today = OffsetDateTime::now_utc().date();
    let total = match monthly_total(user_id, today, &connection) {
        Ok(total) => total,
        Err(error) => return error.into_response(),
    };

    let expense_count = match count_expenses(user_id, &connection) {
        Ok(count) => count,
        Err(error) => return error.into_response(),
    };

    Json(json!({
        "monthly_total": format!("{total:.2}"),
        "expense_count": expense_count,
    }))
    .into_response()
}
