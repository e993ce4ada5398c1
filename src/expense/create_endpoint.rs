//! The expense creation page and endpoint.

use axum::{
    Extension, Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};

use crate::{
    Error, endpoints,
    expense::{
        ExpenseFormData, ExpenseState, FieldErrors, create_expense, expense_form_markup,
        json::{expense_success_response, is_ajax, validation_error_response},
    },
    html::{PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    user::UserID,
};

/// Render the expense creation page with an empty form.
pub async fn get_new_expense_page() -> Response {
    new_expense_view(&ExpenseFormData::default(), &FieldErrors::new()).into_response()
}

/// Handle expense creation form submissions.
///
/// Asynchronous submissions get a JSON payload describing the new expense, or
/// the validation errors with status 400. Plain form submissions are
/// redirected back to the expense list on success, or get the form re-rendered
/// with inline errors.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    headers: HeaderMap,
    Form(form): Form<ExpenseFormData>,
) -> Response {
    let values = match form.validate() {
        Ok(values) => values,
        Err(errors) => {
            if is_ajax(&headers) {
                return validation_error_response(&errors);
            }

            return new_expense_view(&form, &errors).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_expense(&values, user_id, &connection) {
        Ok(expense) if is_ajax(&headers) => expense_success_response(&expense),
        Ok(_) => Redirect::to(endpoints::EXPENSE_LIST).into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating an expense: {error}");
            error.into_response()
        }
    }
}

fn new_expense_view(form: &ExpenseFormData, errors: &FieldErrors) -> Markup {
    let nav_bar = NavBar::new(endpoints::CREATE_EXPENSE).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "Add Expense" }

            (expense_form_markup(endpoints::CREATE_EXPENSE, "Add Expense", form, errors))
        }
    };

    base("Add Expense", &content)
}
