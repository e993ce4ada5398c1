//! The expense model and its database queries.
//!
//! Every read/update/delete in this module filters by both the expense ID and
//! the owning user so that one user can never see or touch another user's
//! records. A missing row and a row owned by someone else are both reported as
//! [Error::NotFound].

use rusqlite::{Connection, Row, ToSql};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, expense::Category, user::UserID};

/// The type of an expense's primary key.
pub type ExpenseId = i64;

/// A single dated, categorized, user-owned spending record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The expense's ID in the application database.
    pub id: ExpenseId,
    /// The amount of money spent.
    pub amount: f64,
    /// The category the expense belongs to.
    pub category: Category,
    /// An optional free-text description. Empty when the user left it blank.
    pub description: String,
    /// The calendar date the expense is recorded against, as entered by the
    /// user. Not necessarily the day the record was created.
    pub date: Date,
    /// When the record was created, assigned by the server in UTC.
    pub created_at: OffsetDateTime,
    /// The user that owns this expense.
    pub user_id: UserID,
}

/// The user-editable fields of an expense, after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseValues {
    pub amount: f64,
    pub category: Category,
    pub description: String,
    pub date: Date,
}

/// Optional narrowing criteria for [list_expenses].
///
/// The category is kept as a raw string: filtering by a string outside the
/// fixed category set matches no rows, which is the intended behavior rather
/// than an error.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Only include expenses whose category code equals this string exactly.
    pub category: Option<String>,
    /// Only include expenses whose description contains this substring
    /// (case-insensitive for ASCII).
    pub search: Option<String>,
}

/// Create the expense table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        amount: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        date: row.get(4)?,
        created_at: row.get(5)?,
        user_id: UserID::new(row.get(6)?),
    })
}

const EXPENSE_COLUMNS: &str = "id, amount, category, description, date, created_at, user_id";

/// Create and insert a new expense owned by `user_id`.
///
/// The creation timestamp is assigned here, never taken from the client.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred, e.g.
/// `user_id` does not refer to a registered user.
pub fn create_expense(
    values: &ExpenseValues,
    user_id: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO expense (amount, category, description, date, created_at, user_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            values.amount,
            values.category,
            &values.description,
            values.date,
            created_at,
            user_id.as_i64(),
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Expense {
        id,
        amount: values.amount,
        category: values.category,
        description: values.description.clone(),
        date: values.date,
        created_at,
        user_id,
    })
}

/// Get the expense with `id` owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such expense, or if the expense
/// belongs to a different user.
pub fn get_expense(
    id: ExpenseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_expense_row,
        )
        .map_err(|error| error.into())
}

/// List the expenses owned by `user_id` in default (creation) order, newest
/// first, optionally narrowed by `filter`.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn list_expenses(
    user_id: UserID,
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let mut sql = format!("SELECT {EXPENSE_COLUMNS} FROM expense WHERE user_id = :user_id");

    let raw_user_id = user_id.as_i64();
    let mut params: Vec<(&str, &dyn ToSql)> = vec![(":user_id", &raw_user_id)];

    if let Some(category) = &filter.category {
        sql.push_str(" AND category = :category");
        params.push((":category", category));
    }

    let search_pattern = filter.search.as_ref().map(|search| format!("%{search}%"));
    if let Some(pattern) = &search_pattern {
        sql.push_str(" AND description LIKE :search");
        params.push((":search", pattern));
    }

    sql.push_str(" ORDER BY created_at DESC, id DESC");

    connection
        .prepare(&sql)?
        .query_map(&params[..], map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::SqlError))
        .collect()
}

/// Get the `limit` most recently created expenses owned by `user_id`.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn recent_expenses(
    user_id: UserID,
    limit: i64,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE user_id = :user_id
                ORDER BY created_at DESC, id DESC LIMIT :limit"
        ))?
        .query_map(
            &[(":user_id", &user_id.as_i64()), (":limit", &limit)],
            map_expense_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(Error::SqlError))
        .collect()
}

/// Count all expenses owned by `user_id`.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_expenses(user_id: UserID, connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM expense WHERE user_id = :user_id",
            &[(":user_id", &user_id.as_i64())],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Sum the amounts of `user_id`'s expenses dated within the same calendar
/// month and year as `today`.
///
/// An empty result set sums to zero. The aggregation happens in a single SQL
/// query over the month's date range.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn monthly_total(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<f64, Error> {
    let month_start = today
        .replace_day(1)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), today.to_string()))?;
    let month_end = today
        .replace_day(time::util::days_in_year_month(today.year(), today.month()))
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), today.to_string()))?;

    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expense
                WHERE user_id = :user_id AND date BETWEEN :start AND :end",
            &[
                (":user_id", &user_id.as_i64() as &dyn ToSql),
                (":start", &month_start),
                (":end", &month_end),
            ],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Replace the editable fields of the expense with `id` owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such expense, or if the expense
/// belongs to a different user. The row is untouched in that case.
pub fn update_expense(
    id: ExpenseId,
    user_id: UserID,
    values: &ExpenseValues,
    connection: &Connection,
) -> Result<Expense, Error> {
    let rows_updated = connection.execute(
        "UPDATE expense
            SET amount = :amount, category = :category,
                description = :description, date = :date
            WHERE id = :id AND user_id = :user_id",
        &[
            (":amount", &values.amount as &dyn ToSql),
            (":category", &values.category),
            (":description", &values.description),
            (":date", &values.date),
            (":id", &id),
            (":user_id", &user_id.as_i64()),
        ],
    )?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    get_expense(id, user_id, connection)
}

/// Delete the expense with `id` owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such expense, or if the expense
/// belongs to a different user.
pub fn delete_expense(
    id: ExpenseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM expense WHERE id = :id AND user_id = :user_id",
        &[(":id", &id), (":user_id", &user_id.as_i64())],
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
