//! Application router configuration with protected and unprotected route definitions.

use axum::{Router, middleware, response::Redirect, routing::get};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::auth_guard,
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, edit_expense_endpoint,
        get_dashboard_page, get_dashboard_stats, get_delete_expense_page, get_edit_expense_page,
        get_expense_detail_page, get_expense_list_page, get_new_expense_page,
    },
    log_in::{get_log_in_page, post_log_in},
    log_out::get_log_out,
    logging::logging_middleware,
    not_found::get_404_not_found,
    register::{get_register_page, post_register},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(
            endpoints::REGISTER,
            get(get_register_page).post(post_register),
        )
        .route(endpoints::LOG_IN, get(get_log_in_page).post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD, get(get_dashboard_page))
        .route(endpoints::DASHBOARD_STATS, get(get_dashboard_stats))
        .route(endpoints::EXPENSE_LIST, get(get_expense_list_page))
        .route(
            endpoints::CREATE_EXPENSE,
            get(get_new_expense_page).post(create_expense_endpoint),
        )
        .route(endpoints::EXPENSE_DETAIL, get(get_expense_detail_page))
        .route(
            endpoints::EDIT_EXPENSE,
            get(get_edit_expense_page).post(edit_expense_endpoint),
        )
        .route(
            endpoints::DELETE_EXPENSE,
            get(get_delete_expense_page).post(delete_expense_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .layer(middleware::from_fn(logging_middleware))
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD)
}


#[cfg(test)]
mod router_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{AppState, endpoints, routing::build_router};

    fn get_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state =
            AppState::new(connection, "nafstenoas").expect("Could not create app state");

        TestServer::builder()
            .save_cookies()
            .build(build_router(state))
    }

    async fn register_default_user(server: &TestServer) {
        let response = server
            .post(endpoints::REGISTER)
            .form(&[
                ("username", "alice"),
                ("email", "alice@example.com"),
                ("password1", "correcthorsebatterystaple"),
                ("password2", "correcthorsebatterystaple"),
            ])
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::DASHBOARD);
    }

    #[tokio::test]
    async fn protected_routes_redirect_unauthenticated_user_to_log_in() {
        let server = get_test_server();

        let protected_routes = [
            endpoints::ROOT.to_owned(),
            endpoints::DASHBOARD.to_owned(),
            endpoints::DASHBOARD_STATS.to_owned(),
            endpoints::EXPENSE_LIST.to_owned(),
            endpoints::CREATE_EXPENSE.to_owned(),
            endpoints::format_endpoint(endpoints::EXPENSE_DETAIL, 1),
            endpoints::format_endpoint(endpoints::EDIT_EXPENSE, 1),
            endpoints::format_endpoint(endpoints::DELETE_EXPENSE, 1),
        ];

        for route in protected_routes {
            let response = server.get(&route).await;

            response.assert_status_see_other();
            assert_eq!(
                response.header("location"),
                endpoints::LOG_IN,
                "expected GET {route} to redirect to the log-in page"
            );
        }
    }

    #[tokio::test]
    async fn register_then_view_dashboard() {
        let server = get_test_server();

        register_default_user(&server).await;

        let response = server.get(endpoints::DASHBOARD).await;

        response.assert_status_ok();
        let text = response.text();
        assert!(text.contains("This Month"), "got dashboard page: {text}");
    }

    #[tokio::test]
    async fn log_in_after_registering() {
        let mut server = get_test_server();
        register_default_user(&server).await;

        server.clear_cookies();
        let response = server
            .post(endpoints::LOG_IN)
            .form(&[
                ("username", "alice"),
                ("password", "correcthorsebatterystaple"),
            ])
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::DASHBOARD);
    }

    #[tokio::test]
    async fn create_expense_then_view_list() {
        let server = get_test_server();
        register_default_user(&server).await;

        let response = server
            .post(endpoints::CREATE_EXPENSE)
            .form(&[
                ("amount", "19.99"),
                ("category", "Food"),
                ("description", "Groceries"),
                ("date", "2024-01-15"),
            ])
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::EXPENSE_LIST);

        let response = server.get(endpoints::EXPENSE_LIST).await;

        response.assert_status_ok();
        let text = response.text();
        assert!(text.contains("Groceries"), "got expense list page: {text}");
    }

    #[tokio::test]
    async fn log_out_then_dashboard_redirects_to_log_in() {
        let server = get_test_server();
        register_default_user(&server).await;

        let response = server.get(endpoints::LOG_OUT).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN);

        let response = server.get(endpoints::DASHBOARD).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let server = get_test_server();

        let response = server.get("/does/not/exist/").await;

        response.assert_status_not_found();
    }
}
