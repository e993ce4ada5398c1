//! The delete confirmation page and the endpoint that deletes an expense.
//!
//! Deletion is a two step flow: a GET renders a confirmation page and only a
//! POST removes the row.

use axum::{
    Extension,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};

use crate::{
    Error, endpoints,
    expense::{
        Expense, ExpenseId, ExpenseState, delete_expense, get_expense,
        json::{delete_success_response, is_ajax},
    },
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base, format_currency},
    navigation::NavBar,
    user::UserID,
};

/// Render the delete confirmation page.
///
/// Requesting an expense that does not exist or belongs to another user
/// renders the not-found page.
pub async fn get_delete_expense_page(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_expense(expense_id, user_id, &connection) {
        Ok(expense) => delete_confirmation_view(&expense).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Delete an expense after the user confirmed it.
///
/// Asynchronous submissions get a JSON acknowledgement carrying the deleted
/// expense's ID so the page can remove its row. Plain form submissions are
/// redirected back to the expense list.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
    headers: HeaderMap,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_expense(expense_id, user_id, &connection) {
        Ok(()) if is_ajax(&headers) => delete_success_response(expense_id),
        Ok(()) => Redirect::to(endpoints::EXPENSE_LIST).into_response(),
        Err(error) => error.into_response(),
    }
}

fn delete_confirmation_view(expense: &Expense) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSE_LIST).into_html();
    let action = endpoints::format_endpoint(endpoints::DELETE_EXPENSE, expense.id);

    let description = if expense.description.is_empty() {
        "(no description)"
    } else {
        &expense.description
    };

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-xl"
            {
                h1 class="text-2xl font-bold mb-6" { "Delete Expense" }

                p class="mb-4"
                {
                    "Are you sure you want to delete the expense \""
                    (description)
                    "\" ("
                    (format_currency(expense.amount))
                    " on "
                    (expense.date)
                    ")? This cannot be undone."
                }

                form method="post" action=(action) class="flex items-center gap-4"
                {
                    button
                        type="submit"
                        class="px-4 py-2 bg-red-600 hover:bg-red-700 text-white rounded"
                    {
                        "Delete"
                    }

                    a
                        href=(endpoints::format_endpoint(endpoints::EXPENSE_DETAIL, expense.id))
                        class=(LINK_STYLE)
                    {
                        "Cancel"
                    }
                }
            }
        }
    };

    base("Delete Expense", &content)
}
