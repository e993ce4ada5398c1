//! Database initialization for the application.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{expense::create_expense_table, user::create_user_table};

/// Create the application's tables if they do not exist.
///
/// Foreign key enforcement is off by default in SQLite, so it is switched on
/// here for every new connection.
///
/// # Errors
///
/// Returns an error if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
