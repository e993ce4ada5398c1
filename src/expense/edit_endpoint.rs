//! The expense edit page and endpoint.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};

use crate::{
    Error, endpoints,
    expense::{
        ExpenseFormData, ExpenseId, ExpenseState, ExpenseValues, FieldErrors,
        expense_form_markup, get_expense,
        json::{expense_success_response, is_ajax, validation_error_response},
        update_expense,
    },
    html::{PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    user::UserID,
};

/// Render the edit page with the form pre-filled from the stored expense.
///
/// Requesting an expense that does not exist or belongs to another user
/// renders the not-found page.
pub async fn get_edit_expense_page(
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

    let expense = match get_expense(expense_id, user_id, &connection) {
        Ok(expense) => expense,
        Err(error) => return error.into_response(),
    };

    let values = ExpenseValues {
        amount: expense.amount,
        category: expense.category,
        description: expense.description,
        date: expense.date,
    };

    edit_expense_view(
        expense_id,
        &ExpenseFormData::from_values(&values),
        &FieldErrors::new(),
    )
    .into_response()
}

/// Handle edit form submissions.
///
/// The response mirrors the create endpoint: JSON for asynchronous
/// submissions, a redirect to the expense list or a re-rendered form
/// otherwise. Editing an expense owned by another user is a not-found error,
/// never a data change.
pub async fn edit_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
    headers: HeaderMap,
    Form(form): Form<ExpenseFormData>,
) -> Response {
    let values = match form.validate() {
        Ok(values) => values,
        Err(errors) => {
            if is_ajax(&headers) {
                return validation_error_response(&errors);
            }

            return edit_expense_view(expense_id, &form, &errors).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_expense(expense_id, user_id, &values, &connection) {
        Ok(expense) if is_ajax(&headers) => expense_success_response(&expense),
        Ok(_) => Redirect::to(endpoints::EXPENSE_LIST).into_response(),
        Err(error) => error.into_response(),
    }
}

fn edit_expense_view(
    expense_id: ExpenseId,
    form: &ExpenseFormData,
    errors: &FieldErrors,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSE_LIST).into_html();
    let action = endpoints::format_endpoint(endpoints::EDIT_EXPENSE, expense_id);

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "Edit Expense" }

            (expense_form_markup(&action, "Save Changes", form, errors))
        }
    };

    base("Edit Expense", &content)
}


#[cfg(test)]
mod edit_expense_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::{HeaderMap, HeaderValue, StatusCode},
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        PasswordHash,
        db::initialize,
        endpoints,
        expense::{
            Category, Expense, ExpenseFormData, ExpenseState, ExpenseValues, create_expense,
            get_expense,
        },
        test_utils::{assert_redirect, parse_json_body},
        user::{UserID, create_user},
    };

    use super::edit_expense_endpoint;

    fn get_test_state_and_user() -> (ExpenseState, UserID) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        let user = create_user(
            "alice",
            "alice@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            ExpenseState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    fn insert_expense(state: &ExpenseState, user_id: UserID) -> Expense {
        let connection = state.db_connection.lock().unwrap();

        create_expense(
            &ExpenseValues {
                amount: 12.5,
                category: Category::Food,
                description: "lunch".to_owned(),
                date: date!(2024 - 01 - 15),
            },
            user_id,
            &connection,
        )
        .unwrap()
    }

    fn updated_form() -> ExpenseFormData {
        ExpenseFormData {
            amount: "20.00".to_owned(),
            category: "Transport".to_owned(),
            description: "train".to_owned(),
            date: "2024-01-16".to_owned(),
        }
    }

    #[tokio::test]
    async fn edit_expense_updates_row_and_redirects() {
        let (state, user_id) = get_test_state_and_user();
        let expense = insert_expense(&state, user_id);

        let response = edit_expense_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(expense.id),
            HeaderMap::new(),
            Form(updated_form()),
        )
        .await;

        assert_redirect(&response, endpoints::EXPENSE_LIST);

        let connection = state.db_connection.lock().unwrap();
        let updated = get_expense(expense.id, user_id, &connection).unwrap();
        assert_eq!(updated.amount, 20.0);
        assert_eq!(updated.category, Category::Transport);
        assert_eq!(updated.description, "train");
        assert_eq!(updated.date, date!(2024 - 01 - 16));
    }

    #[tokio::test]
    async fn edit_expense_with_ajax_returns_updated_expense() {
        let (state, user_id) = get_test_state_and_user();
        let expense = insert_expense(&state, user_id);

        let mut headers = HeaderMap::new();
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));

        let response = edit_expense_endpoint(
            State(state),
            Extension(user_id),
            Path(expense.id),
            headers,
            Form(updated_form()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["expense"]["id"], expense.id);
        assert_eq!(body["expense"]["amount"], "20.00");
        assert_eq!(body["expense"]["category_code"], "Transport");
    }

    #[tokio::test]
    async fn edit_expense_rejects_other_users_expense() {
        let (state, owner_id) = get_test_state_and_user();
        let expense = insert_expense(&state, owner_id);

        let other_user_id = {
            let connection = state.db_connection.lock().unwrap();
            create_user(
                "bob",
                "bob@example.com",
                PasswordHash::new_unchecked("hunter2"),
                &connection,
            )
            .unwrap()
            .id
        };

        let response = edit_expense_endpoint(
            State(state.clone()),
            Extension(other_user_id),
            Path(expense.id),
            HeaderMap::new(),
            Form(updated_form()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let connection = state.db_connection.lock().unwrap();
        let untouched = get_expense(expense.id, owner_id, &connection).unwrap();
        assert_eq!(untouched.amount, 12.5);
    }

    #[tokio::test]
    async fn edit_expense_rerenders_form_on_invalid_input() {
        let (state, user_id) = get_test_state_and_user();
        let expense = insert_expense(&state, user_id);

        let mut form = updated_form();
        form.amount = "-5".to_owned();
        let response = edit_expense_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(expense.id),
            HeaderMap::new(),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        let untouched = get_expense(expense.id, user_id, &connection).unwrap();
        assert_eq!(untouched.amount, 12.5);
    }
}
