use axum::response::Html;
use axum::{routing::get, Router};

use crate::state::AppState;

/// Embedded operator dashboard.
const DASHBOARD_HTML: &str = include_str!("../../static/dashboard.html");

/// GET / -- serves the dashboard page.
async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}
