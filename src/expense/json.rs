//! JSON responses for asynchronous expense form submissions.
//!
//! The browser-side script submits the create, edit and delete forms with
//! `XMLHttpRequest` and sets the `X-Requested-With` header. Handlers detect
//! that header and answer with JSON instead of a redirect so the page can
//! update in place.

use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use time::macros::format_description;

use crate::expense::{Expense, ExpenseId, FieldErrors};

/// Whether the request came from the browser-side script rather than a plain
/// form submission.
pub fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == "XMLHttpRequest")
}

/// The JSON shape of an expense as consumed by the browser-side script.
#[derive(Debug, Serialize)]
pub struct ExpenseDetails {
    pub id: ExpenseId,
    pub date: String,
    pub category: String,
    pub category_code: String,
    pub amount: String,
    pub description: String,
    pub created_at: String,
}

impl From<&Expense> for ExpenseDetails {
    fn from(expense: &Expense) -> Self {
        // E.g. "Jan 15, 2024 03:45 PM".
        let created_at_format = format_description!(
            "[month repr:short] [day], [year] [hour repr:12]:[minute] [period case:upper]"
        );
        let created_at = expense
            .created_at
            .format(&created_at_format)
            .unwrap_or_else(|error| {
                tracing::error!("could not format expense creation timestamp: {error}");
                String::new()
            });

        Self {
            id: expense.id,
            date: expense.date.to_string(),
            category: expense.category.display_name().to_owned(),
            category_code: expense.category.code().to_owned(),
            amount: format!("{:.2}", expense.amount),
            description: expense.description.clone(),
            created_at,
        }
    }
}

/// The success payload for an asynchronous create or edit.
pub fn expense_success_response(expense: &Expense) -> Response {
    Json(json!({
        "status": "success",
        "expense": ExpenseDetails::from(expense),
    }))
    .into_response()
}

/// The failure payload for an asynchronous create or edit with invalid
/// fields.
pub fn validation_error_response(errors: &FieldErrors) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "status": "error",
            "errors": errors,
        })),
    )
        .into_response()
}

/// The success payload for an asynchronous delete.
pub fn delete_success_response(expense_id: ExpenseId) -> Response {
    Json(json!({
        "status": "success",
        "message": "Expense deleted successfully",
        "expense_id": expense_id,
    }))
    .into_response()
}
