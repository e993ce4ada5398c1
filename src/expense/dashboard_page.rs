//! The dashboard page: a summary of the user's spending this month and their
//! most recent expenses.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::OffsetDateTime;

use crate::{
    Error, endpoints,
    expense::{Expense, ExpenseState, count_expenses, monthly_total, recent_expenses},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency,
    },
    navigation::NavBar,
    user::UserID,
};

/// How many recent expenses the dashboard shows.
const RECENT_EXPENSE_COUNT: i64 = 5;

/// Display a page with an overview of the user's spending.
pub async fn get_dashboard_page(
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

    let recent = match recent_expenses(user_id, RECENT_EXPENSE_COUNT, &connection) {
        Ok(expenses) => expenses,
        Err(error) => return error.into_response(),
    };

    dashboard_view(total, expense_count, &recent).into_response()
}

fn summary_card(title: &str, value: &str) -> Markup {
    html! {
        div class="rounded-lg bg-white dark:bg-gray-800 shadow p-6 text-center"
        {
            h2 class="text-sm font-medium text-gray-500 dark:text-gray-400 uppercase" { (title) }
            p class="mt-2 text-3xl font-bold" { (value) }
        }
    }
}

fn recent_expenses_table(expenses: &[Expense]) -> Markup {
    html! {
        @if expenses.is_empty() {
            p class="text-gray-500 dark:text-gray-400" { "No expenses yet." }
        } @else {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                    }
                }

                tbody
                {
                    @for expense in expenses {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (expense.date) }
                            td class=(TABLE_CELL_STYLE) { (expense.category) }
                            td class=(TABLE_CELL_STYLE) {
                                a
                                    href=(endpoints::format_endpoint(endpoints::EXPENSE_DETAIL, expense.id))
                                    class=(LINK_STYLE)
                                {
                                    @if expense.description.is_empty() {
                                        "(no description)"
                                    } @else {
                                        (expense.description)
                                    }
                                }
                            }
                            td class=(TABLE_CELL_STYLE) { (format_currency(expense.amount)) }
                        }
                    }
                }
            }
        }
    }
}

fn dashboard_view(total: f64, expense_count: i64, recent: &[Expense]) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-3xl flex flex-col gap-6"
            {
                div id="dashboard-summary" class="grid grid-cols-1 sm:grid-cols-2 gap-4"
                {
                    (summary_card("This Month", &format_currency(total)))
                    (summary_card("Total Expenses", &expense_count.to_string()))
                }

                section
                {
                    h2 class="text-xl font-bold mb-4" { "Recent Expenses" }
                    (recent_expenses_table(recent))

                    p class="mt-4"
                    {
                        a href=(endpoints::EXPENSE_LIST) class=(LINK_STYLE) { "View all expenses" }
                    }
                }
            }
        }
    };

    base("Dashboard", &content)
}

#[cfg(test)]
mod dashboard_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::Selector;
    use time::{Duration, OffsetDateTime};

    use crate::{
        PasswordHash,
        db::initialize,
        expense::{Category, ExpenseState, ExpenseValues, create_expense},
        test_utils::{assert_valid_html, parse_html_document},
        user::{UserID, create_user},
    };

    use super::get_dashboard_page;

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

    #[tokio::test]
    async fn dashboard_shows_monthly_total_and_recent_expenses() {
        let (state, user_id) = get_test_state_and_user();
        let today = OffsetDateTime::now_utc().date();

        {
            let connection = state.db_connection.lock().unwrap();
            create_expense(
                &ExpenseValues {
                    amount: 12.5,
                    category: Category::Food,
                    description: "lunch".to_owned(),
                    date: today,
                },
                user_id,
                &connection,
            )
            .unwrap();
            create_expense(
                &ExpenseValues {
                    amount: 30.0,
                    category: Category::Transport,
                    description: "fuel".to_owned(),
                    date: today,
                },
                user_id,
                &connection,
            )
            .unwrap();
            // Dated well outside this month, so only counted in the total count.
            create_expense(
                &ExpenseValues {
                    amount: 99.0,
                    category: Category::Other,
                    description: "old".to_owned(),
                    date: today - Duration::days(60),
                },
                user_id,
                &connection,
            )
            .unwrap();
        }

        let response = get_dashboard_page(State(state), Extension(user_id)).await;

        assert_eq!(response.status(), StatusCode::OK);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let summary = document
            .select(&Selector::parse("#dashboard-summary").unwrap())
            .next()
            .expect("no summary section found")
            .text()
            .collect::<String>();
        assert!(
            summary.contains("$42.50"),
            "summary should contain monthly total $42.50, got: {summary}"
        );
        assert!(
            summary.contains('3'),
            "summary should contain the expense count 3, got: {summary}"
        );

        let rows = document
            .select(&Selector::parse("tbody tr").unwrap())
            .count();
        assert_eq!(rows, 3, "want 3 recent expense rows, got {rows}");
    }

    #[tokio::test]
    async fn dashboard_renders_with_no_expenses() {
        let (state, user_id) = get_test_state_and_user();

        let response = get_dashboard_page(State(state), Extension(user_id)).await;

        assert_eq!(response.status(), StatusCode::OK);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let body_text = document.root_element().text().collect::<String>();
        assert!(body_text.contains("No expenses yet."));
        assert!(body_text.contains("$0.00"));
    }
}
