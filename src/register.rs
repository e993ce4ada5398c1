//! The registration page and the endpoint that creates new user accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use email_address::EmailAddress;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    auth::{get_user_id_from_auth_cookie, invalidate_auth_cookie, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, log_in_register,
    },
    user::{create_user, email_exists, username_exists},
};

/// Usernames are capped at 150 characters for parity with the legacy
/// accounts table.
const USERNAME_MAX_LENGTH: usize = 150;

/// The state needed to register a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data submitted through the registration form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterFormData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// Per-field error messages for the registration form.
#[derive(Debug, Default, PartialEq)]
pub struct RegisterFormErrors {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
}

impl RegisterFormErrors {
    fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password1.is_none()
            && self.password2.is_none()
    }
}

fn is_valid_username_char(character: char) -> bool {
    character.is_alphanumeric() || matches!(character, '@' | '.' | '+' | '-' | '_')
}

/// Validate the non-password fields and the password pair, checking username
/// and email uniqueness against the database.
fn validate_registration(
    form: &RegisterFormData,
    connection: &Connection,
) -> Result<(ValidatedPassword, RegisterFormErrors), Error> {
    let mut errors = RegisterFormErrors::default();

    if form.username.is_empty() {
        errors.username = Some("This field is required.".to_owned());
    } else if form.username.len() > USERNAME_MAX_LENGTH {
        errors.username = Some(format!(
            "Ensure this value has at most {USERNAME_MAX_LENGTH} characters."
        ));
    } else if !form.username.chars().all(is_valid_username_char) {
        errors.username = Some(
            "Enter a valid username. This value may contain only letters, numbers, \
                and @/./+/-/_ characters."
                .to_owned(),
        );
    } else if username_exists(&form.username, connection)? {
        errors.username = Some("A user with that username already exists.".to_owned());
    }

    if form.email.is_empty() {
        errors.email = Some("This field is required.".to_owned());
    } else if !EmailAddress::is_valid(&form.email) {
        errors.email = Some("Enter a valid email address.".to_owned());
    } else if email_exists(&form.email, connection)? {
        errors.email = Some("This email is already registered.".to_owned());
    }

    let password = match ValidatedPassword::new(&form.password1) {
        Ok(password) => Some(password),
        Err(Error::TooWeak(feedback)) => {
            errors.password1 = Some(feedback);
            None
        }
        Err(error) => return Err(error),
    };

    if form.password1 != form.password2 {
        errors.password2 = Some("The two password fields didn't match.".to_owned());
    }

    // A placeholder password is fine here since a non-empty error map means
    // registration will not proceed.
    let password = password.unwrap_or_else(|| ValidatedPassword::new_unchecked(""));

    Ok((password, errors))
}

fn field_error_markup(error: Option<&str>) -> Markup {
    html! {
        @if let Some(error) = error {
            p class="text-red-500 text-base" { (error) }
        }
    }
}

fn register_form(form: &RegisterFormData, errors: &RegisterFormErrors) -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::REGISTER)
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="username" class=(FORM_LABEL_STYLE) { "Username" }

                input
                    type="text"
                    name="username"
                    id="username"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    autofocus
                    maxlength=(USERNAME_MAX_LENGTH)
                    value=(form.username);

                (field_error_markup(errors.username.as_deref()))
            }

            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "Email" }

                input
                    type="email"
                    name="email"
                    id="email"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(form.email);

                (field_error_markup(errors.email.as_deref()))
            }

            div
            {
                label for="password1" class=(FORM_LABEL_STYLE) { "Password" }

                input
                    type="password"
                    name="password1"
                    id="password1"
                    placeholder="••••••••"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;

                (field_error_markup(errors.password1.as_deref()))
            }

            div
            {
                label for="password2" class=(FORM_LABEL_STYLE) { "Confirm password" }

                input
                    type="password"
                    name="password2"
                    id="password2"
                    placeholder="••••••••"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;

                (field_error_markup(errors.password2.as_deref()))
            }

            button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE) { "Register" }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Already have an account? "
                a
                    href=(endpoints::LOG_IN) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

fn register_view(form: &RegisterFormData, errors: &RegisterFormErrors) -> Markup {
    let content = log_in_register("Create an account", &register_form(form, errors));

    base("Register", &content)
}

/// Display the registration page.
///
/// Users that are already logged in are sent straight to the dashboard.
pub async fn get_register_page(jar: PrivateCookieJar) -> Response {
    if get_user_id_from_auth_cookie(&jar).is_ok() {
        return Redirect::to(endpoints::DASHBOARD).into_response();
    }

    register_view(&RegisterFormData::default(), &RegisterFormErrors::default()).into_response()
}

/// Handle registration form submissions.
///
/// On success the new user is logged in immediately and redirected to the
/// dashboard. On validation failure the form is re-rendered with per-field
/// error messages and the submitted username and email preserved.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn post_register(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterFormData>,
) -> Response {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire lock to database connection");

    let (password, errors) = match validate_registration(&form, &connection) {
        Ok(result) => result,
        Err(error) => return error.into_response(),
    };

    if !errors.is_empty() {
        return register_view(&form, &errors).into_response();
    }

    let password_hash = match PasswordHash::new(password, PasswordHash::DEFAULT_COST) {
        Ok(password_hash) => password_hash,
        Err(error) => return error.into_response(),
    };

    let user = match create_user(&form.username, &form.email, password_hash, &connection) {
        Ok(user) => user,
        // The uniqueness checks above race against concurrent registrations,
        // the database constraint has the final say.
        Err(Error::DuplicateUsername) => {
            let errors = RegisterFormErrors {
                username: Some("A user with that username already exists.".to_owned()),
                ..RegisterFormErrors::default()
            };
            return register_view(&form, &errors).into_response();
        }
        Err(Error::DuplicateEmail) => {
            let errors = RegisterFormErrors {
                email: Some("This email is already registered.".to_owned()),
                ..RegisterFormErrors::default()
            };
            return register_view(&form, &errors).into_response();
        }
        Err(error) => return error.into_response(),
    };

    set_auth_cookie(jar.clone(), user.id, state.cookie_duration)
        .map(|updated_jar| (updated_jar, Redirect::to(endpoints::DASHBOARD)))
        .map_err(|err| {
            tracing::error!("Error setting auth cookie: {err}");
            (
                invalidate_auth_cookie(jar),
                Error::InvalidDateFormat(err.to_string(), String::new()),
            )
        })
        .into_response()
}

#[cfg(test)]
mod register_page_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use sha2::{Digest, Sha512};

    use crate::{
        auth::{DEFAULT_COOKIE_DURATION, set_auth_cookie},
        endpoints,
        test_utils::{
            assert_form_action, assert_form_input, assert_valid_html, must_get_form,
            parse_html_document,
        },
        user::UserID,
    };

    use super::get_register_page;

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");

        PrivateCookieJar::new(Key::from(&hash))
    }

    #[tokio::test]
    async fn register_page_displays_form() {
        let response = get_register_page(get_jar()).await;

        assert_eq!(response.status(), StatusCode::OK);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_form_action(&form, endpoints::REGISTER);
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password1", "password");
        assert_form_input(&form, "password2", "password");
    }

    #[tokio::test]
    async fn register_page_redirects_logged_in_user_to_dashboard() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), DEFAULT_COOKIE_DURATION).unwrap();

        let response = get_register_page(jar).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::DASHBOARD
        );
    }
}

#[cfg(test)]
mod register_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        body::Body,
        extract::State,
        http::{Response, StatusCode},
    };
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use rusqlite::Connection;
    use scraper::Selector;
    use sha2::{Digest, Sha512};
    use time::Duration;

    use crate::{
        auth::cookie::COOKIE_USER_ID,
        db::initialize,
        endpoints,
        test_utils::parse_html_document,
        user::get_user_by_username,
    };

    use super::{RegisterFormData, RegistrationState, post_register};

    fn get_test_state() -> RegistrationState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        let hash = Sha512::digest(b"foobar");

        RegistrationState {
            cookie_key: Key::from(&hash),
            cookie_duration: Duration::days(14),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn valid_form() -> RegisterFormData {
        RegisterFormData {
            username: "alice".to_owned(),
            email: "alice@example.com".to_owned(),
            password1: "correcthorsebatterystaple".to_owned(),
            password2: "correcthorsebatterystaple".to_owned(),
        }
    }

    async fn register(state: RegistrationState, form: RegisterFormData) -> Response<Body> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        post_register(State(state), jar, Form(form)).await
    }

    async fn field_error(response: Response<Body>, field: &str) -> String {
        let document = parse_html_document(response).await;
        let selector = Selector::parse(&format!("input#{field} + p.text-red-500")).unwrap();

        document
            .select(&selector)
            .next()
            .unwrap_or_else(|| panic!("no error message found for field {field}"))
            .text()
            .collect::<String>()
            .trim()
            .to_owned()
    }

    #[tokio::test]
    async fn register_creates_user_and_logs_them_in() {
        let state = get_test_state();

        let response = register(state.clone(), valid_form()).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::DASHBOARD
        );

        let set_cookie_headers = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>();
        assert!(
            set_cookie_headers
                .iter()
                .any(|header| header.starts_with(COOKIE_USER_ID)),
            "expected auth cookie in {set_cookie_headers:?}"
        );

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_username("alice", &connection).unwrap();
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let state = get_test_state();
        register(state.clone(), valid_form()).await;

        let mut form = valid_form();
        form.email = "alice2@example.com".to_owned();
        let response = register(state, form).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            field_error(response, "username").await,
            "A user with that username already exists."
        );
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let state = get_test_state();
        register(state.clone(), valid_form()).await;

        let mut form = valid_form();
        form.username = "alice2".to_owned();
        let response = register(state, form).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            field_error(response, "email").await,
            "This email is already registered."
        );
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() {
        let state = get_test_state();

        let mut form = valid_form();
        form.email = "not-an-email".to_owned();
        let response = register(state, form).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            field_error(response, "email").await,
            "Enter a valid email address."
        );
    }

    #[tokio::test]
    async fn register_rejects_invalid_username_characters() {
        let state = get_test_state();

        let mut form = valid_form();
        form.username = "alice smith!".to_owned();
        let response = register(state, form).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            field_error(response, "username").await,
            "Enter a valid username. This value may contain only letters, numbers, \
                and @/./+/-/_ characters."
        );
    }

    #[tokio::test]
    async fn register_rejects_mismatched_passwords() {
        let state = get_test_state();

        let mut form = valid_form();
        form.password2 = "somethingelseentirely".to_owned();
        let response = register(state, form).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            field_error(response, "password2").await,
            "The two password fields didn't match."
        );
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let state = get_test_state();

        let mut form = valid_form();
        form.password1 = "password".to_owned();
        form.password2 = "password".to_owned();
        let response = register(state, form).await;

        assert_eq!(response.status(), StatusCode::OK);
        let error = field_error(response, "password1").await;
        assert!(!error.is_empty(), "expected a password strength error");
    }

    #[tokio::test]
    async fn register_does_not_create_user_on_validation_failure() {
        let state = get_test_state();

        let mut form = valid_form();
        form.password2 = "somethingelseentirely".to_owned();
        register(state.clone(), form).await;

        let connection = state.db_connection.lock().unwrap();
        assert!(get_user_by_username("alice", &connection).is_err());
    }
}
