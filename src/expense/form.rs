//! Parsing and validation of the expense create/edit form.
//!
//! Validation collects every field error rather than stopping at the first,
//! so the user can fix the whole form in one pass. The error map is keyed by
//! field name and is rendered both inline in the HTML form and as the JSON
//! error payload for asynchronous submissions.

use std::collections::BTreeMap;

use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{
    expense::{Category, ExpenseValues},
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
};

/// The raw, unvalidated fields of the expense form as submitted by the
/// browser.
///
/// Every field defaults to the empty string so a submission with missing keys
/// validates the same way as one with blank values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseFormData {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
}

/// Validation errors keyed by form field name.
///
/// A `BTreeMap` keeps the field order stable in JSON output and tests.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

const MAX_AMOUNT_DIGITS: u32 = 10;
const MAX_DECIMAL_PLACES: u32 = 2;

impl ExpenseFormData {
    /// Build form data from an existing expense for pre-filling the edit
    /// form.
    pub fn from_values(values: &ExpenseValues) -> Self {
        Self {
            amount: format!("{:.2}", values.amount),
            category: values.category.code().to_owned(),
            description: values.description.clone(),
            date: values.date.to_string(),
        }
    }

    /// Validate the form and convert it into typed expense values.
    ///
    /// # Errors
    ///
    /// Returns the full map of per-field error messages when any field is
    /// invalid. A field with multiple problems reports only its first.
    pub fn validate(&self) -> Result<ExpenseValues, FieldErrors> {
        let mut errors = FieldErrors::new();

        let amount = match validate_amount(&self.amount) {
            Ok(amount) => Some(amount),
            Err(message) => {
                errors.insert("amount", vec![message]);
                None
            }
        };

        let category = match validate_category(&self.category) {
            Ok(category) => Some(category),
            Err(message) => {
                errors.insert("category", vec![message]);
                None
            }
        };

        let date = match validate_date(&self.date) {
            Ok(date) => Some(date),
            Err(message) => {
                errors.insert("date", vec![message]);
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        // All three are Some once the error map is empty.
        match (amount, category, date) {
            (Some(amount), Some(category), Some(date)) => Ok(ExpenseValues {
                amount,
                category,
                description: self.description.trim().to_owned(),
                date,
            }),
            _ => unreachable!("field errors were checked above"),
        }
    }
}

fn validate_amount(raw_amount: &str) -> Result<f64, String> {
    let trimmed = raw_amount.trim();

    if trimmed.is_empty() {
        return Err("This field is required.".to_owned());
    }

    let amount: f64 = trimmed
        .parse()
        .map_err(|_| "Enter a number.".to_owned())?;

    if !amount.is_finite() {
        return Err("Enter a number.".to_owned());
    }

    if amount < 0.0 {
        return Err("Ensure this value is greater than or equal to 0.".to_owned());
    }

    // f64 parsing accepts scientific notation, which would let a value with
    // far more digits than the string shows through the caps below.
    let unsigned = trimmed.trim_start_matches('+');
    if !unsigned
        .chars()
        .all(|character| character.is_ascii_digit() || character == '.')
    {
        return Err("Enter a number.".to_owned());
    }

    let digits: Vec<&str> = unsigned.split('.').collect();
    let integer_digits = digits.first().map_or(0, |part| part.len() as u32);
    let decimal_digits = digits.get(1).map_or(0, |part| part.len() as u32);

    if decimal_digits > MAX_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {MAX_DECIMAL_PLACES} decimal places."
        ));
    }

    if integer_digits + decimal_digits > MAX_AMOUNT_DIGITS {
        return Err(format!(
            "Ensure that there are no more than {MAX_AMOUNT_DIGITS} digits in total."
        ));
    }

    Ok(amount)
}

fn validate_category(raw_category: &str) -> Result<Category, String> {
    if raw_category.is_empty() {
        return Err("This field is required.".to_owned());
    }

    Category::from_code(raw_category).ok_or_else(|| {
        format!("Select a valid choice. {raw_category} is not one of the available choices.")
    })
}

fn validate_date(raw_date: &str) -> Result<Date, String> {
    if raw_date.trim().is_empty() {
        return Err("This field is required.".to_owned());
    }

    Date::parse(
        raw_date.trim(),
        format_description!("[year]-[month]-[day]"),
    )
    .map_err(|_| "Enter a valid date.".to_owned())
}

fn field_errors_markup(errors: &FieldErrors, field: &str) -> Markup {
    html! {
        @if let Some(messages) = errors.get(field) {
            ul class="text-sm text-red-600 mt-1" {
                @for message in messages {
                    li { (message) }
                }
            }
        }
    }
}

/// The shared create/edit expense form.
///
/// `form` carries the previously submitted (or pre-filled) values so a
/// failed validation re-renders the user's input rather than a blank form.
pub fn expense_form_markup(
    action: &str,
    submit_label: &str,
    form: &ExpenseFormData,
    errors: &FieldErrors,
) -> Markup {
    html! {
        form method="post" action=(action) class="flex flex-col gap-4 max-w-md" {
            div {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                input
                    type="number"
                    id="amount"
                    name="amount"
                    step="0.01"
                    min="0"
                    value=(form.amount)
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
                (field_errors_markup(errors, "amount"))
            }
            div {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                select id="category" name="category" class=(FORM_TEXT_INPUT_STYLE) required {
                    @for category in Category::ALL {
                        option
                            value=(category.code())
                            selected[form.category == category.code()]
                        { (category.display_name()) }
                    }
                }
                (field_errors_markup(errors, "category"))
            }
            div {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                textarea
                    id="description"
                    name="description"
                    rows="3"
                    class=(FORM_TEXT_INPUT_STYLE)
                { (form.description) }
                (field_errors_markup(errors, "description"))
            }
            div {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                input
                    type="date"
                    id="date"
                    name="date"
                    value=(form.date)
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
                (field_errors_markup(errors, "date"))
            }
            input
                type="submit"
                value=(submit_label)
                class="rounded bg-blue-500 py-2 text-white font-bold cursor-pointer hover:bg-blue-600";
        }
    }
}
