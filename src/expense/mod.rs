//! Expense tracking: the data model, form validation, and the routes for
//! listing, creating, viewing, editing and deleting expenses.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod category;
mod create_endpoint;
mod dashboard_page;
mod delete_endpoint;
mod detail_page;
mod edit_endpoint;
mod form;
mod json;
mod list_page;
mod model;
mod stats_endpoint;

pub use category::Category;
pub use model::{
    Expense, ExpenseFilter, ExpenseId, ExpenseValues, count_expenses, create_expense,
    create_expense_table, delete_expense, get_expense, list_expenses, monthly_total,
    recent_expenses, update_expense,
};
pub use create_endpoint::{create_expense_endpoint, get_new_expense_page};
pub use dashboard_page::get_dashboard_page;
pub use delete_endpoint::{delete_expense_endpoint, get_delete_expense_page};
pub use detail_page::get_expense_detail_page;
pub use edit_endpoint::{edit_expense_endpoint, get_edit_expense_page};
pub use form::{ExpenseFormData, FieldErrors, expense_form_markup};
pub use list_page::get_expense_list_page;
pub use stats_endpoint::get_dashboard_stats;

/// The state needed by the expense routes.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
