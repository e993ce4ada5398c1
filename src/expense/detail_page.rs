//! The read-only detail page for a single expense.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error, endpoints,
    expense::{
        Expense, ExpenseId, ExpenseState, get_expense,
        json::ExpenseDetails,
    },
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, format_currency,
    },
    navigation::NavBar,
    user::UserID,
};

/// Display a single expense.
///
/// Requesting an expense that does not exist or belongs to another user
/// renders the not-found page.
pub async fn get_expense_detail_page(
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
        Ok(expense) => expense_detail_view(&expense).into_response(),
        Err(error) => error.into_response(),
    }
}

fn detail_row(label: &str, value: &str) -> Markup {
    html! {
        div class="flex justify-between border-b border-gray-200 dark:border-gray-700 py-3"
        {
            dt class="font-medium" { (label) }
            dd { (value) }
        }
    }
}

fn expense_detail_view(expense: &Expense) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSE_LIST).into_html();
    let details = ExpenseDetails::from(expense);

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
                h1 class="text-2xl font-bold mb-6" { "Expense Details" }

                dl class="rounded-lg bg-white dark:bg-gray-800 shadow px-6 py-2"
                {
                    (detail_row("Date", &details.date))
                    (detail_row("Category", &details.category))
                    (detail_row("Description", description))
                    (detail_row("Amount", &format_currency(expense.amount)))
                    (detail_row("Created", &details.created_at))
                }

                div class="flex gap-4 mt-6"
                {
                    a
                        href=(endpoints::format_endpoint(endpoints::EDIT_EXPENSE, expense.id))
                        class=(LINK_STYLE)
                    { "Edit" }

                    a
                        href=(endpoints::format_endpoint(endpoints::DELETE_EXPENSE, expense.id))
                        class=(BUTTON_DELETE_STYLE)
                    { "Delete" }

                    a href=(endpoints::EXPENSE_LIST) class=(LINK_STYLE) { "Back to Expenses" }
                }
            }
        }
    };

    base("Expense Details", &content)
}
