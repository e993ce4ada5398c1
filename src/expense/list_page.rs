//! The expense list page with category and description filters.

use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error, endpoints,
    expense::{Category, Expense, ExpenseFilter, ExpenseState, list_expenses},
    html::{
        BUTTON_DELETE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency,
    },
    navigation::NavBar,
    user::UserID,
};

/// The filter query parameters accepted by the list page.
///
/// Both filters are optional and combine with AND. An unknown category code
/// is not an error, it simply matches nothing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

/// Display the user's expenses, optionally narrowed by the filter form.
pub async fn get_expense_list_page(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ExpenseListQuery>,
) -> Response {
    let filter = ExpenseFilter {
        category: query.category.clone().filter(|category| !category.is_empty()),
        search: query.search.clone().filter(|search| !search.is_empty()),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let expenses = match list_expenses(user_id, &filter, &connection) {
        Ok(expenses) => expenses,
        Err(error) => return error.into_response(),
    };

    expense_list_view(&expenses, &query).into_response()
}

fn filter_form(query: &ExpenseListQuery) -> Markup {
    let selected_category = query.category.as_deref().unwrap_or("");
    let search = query.search.as_deref().unwrap_or("");

    html! {
        form
            method="get"
            action=(endpoints::EXPENSE_LIST)
            class="flex flex-wrap items-end gap-4 mb-6"
        {
            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                select id="category" name="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[selected_category.is_empty()] { "All categories" }
                    @for category in Category::ALL {
                        option
                            value=(category.code())
                            selected[selected_category == category.code()]
                        { (category.display_name()) }
                    }
                }
            }

            div
            {
                label for="search" class=(FORM_LABEL_STYLE) { "Description" }
                input
                    type="search"
                    id="search"
                    name="search"
                    placeholder="Search descriptions"
                    value=(search)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button
                type="submit"
                class="px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:bg-blue-600 text-white rounded"
            {
                "Filter"
            }
        }
    }
}

fn expense_row(expense: &Expense) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (expense.date) }
            td class=(TABLE_CELL_STYLE) { (expense.category) }
            td class=(TABLE_CELL_STYLE) {
                @if expense.description.is_empty() {
                    "(no description)"
                } @else {
                    (expense.description)
                }
            }
            td class=(TABLE_CELL_STYLE) { (format_currency(expense.amount)) }
            td class=(TABLE_CELL_STYLE) {
                div class="flex gap-3"
                {
                    a
                        href=(endpoints::format_endpoint(endpoints::EXPENSE_DETAIL, expense.id))
                        class=(LINK_STYLE)
                    { "View" }

                    a
                        href=(endpoints::format_endpoint(endpoints::EDIT_EXPENSE, expense.id))
                        class=(LINK_STYLE)
                    { "Edit" }

                    a
                        href=(endpoints::format_endpoint(endpoints::DELETE_EXPENSE, expense.id))
                        class=(BUTTON_DELETE_STYLE)
                    { "Delete" }
                }
            }
        }
    }
}

fn expense_list_view(expenses: &[Expense], query: &ExpenseListQuery) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSE_LIST).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl"
            {
                div class="flex items-center justify-between mb-6"
                {
                    h1 class="text-2xl font-bold" { "Expenses" }

                    a href=(endpoints::CREATE_EXPENSE) class=(LINK_STYLE) { "Add Expense" }
                }

                (filter_form(query))

                @if expenses.is_empty() {
                    p class="text-gray-500 dark:text-gray-400" { "No expenses found." }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for expense in expenses {
                                (expense_row(expense))
                            }
                        }
                    }
                }
            }
        }
    };

    base("Expenses", &content)
}
