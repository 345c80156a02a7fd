use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use chrono::Utc;
use log::info;
use serde::Deserialize;
use serde_json::json;

use crate::auth::SessionManager;
use crate::market::cache::MarketCache;
use crate::market::movers::rank_movers;
use crate::market::overview::get_overview;
use crate::market::provider::QuoteSource;

pub const SESSION_COOKIE: &str = "session";
pub const TOP_MOVERS: usize = 10;

#[derive(Clone)]
pub struct ApiState {
    pub sessions: SessionManager,
    pub cache: Arc<MarketCache>,
    pub source: Arc<dyn QuoteSource>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// Extract the session token from the Cookie header
fn extract_session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .filter_map(|pair| pair.trim().split_once('='))
                .find(|(name, _)| *name == SESSION_COOKIE)
                .map(|(_, token)| token.to_string())
        })
}

// Resolve the request to a logged-in username, if any
fn authenticate(headers: &HeaderMap, sessions: &SessionManager) -> Option<String> {
    extract_session_from_headers(headers).and_then(|token| sessions.validate(&token))
}

fn login_page(error: Option<&str>) -> String {
    let banner = error
        .map(|message| format!("<p class=\"error\">{}</p>", message))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n<html dir=\"rtl\" lang=\"ar\">\n<head><meta charset=\"utf-8\"><title>تسجيل الدخول</title></head>\n<body>\n<h1>السوق السعودي</h1>\n{}<form method=\"post\" action=\"/login\">\n<input name=\"username\" placeholder=\"اسم المستخدم\">\n<input type=\"password\" name=\"password\" placeholder=\"كلمة المرور\">\n<button type=\"submit\">دخول</button>\n</form>\n</body>\n</html>",
        banner
    )
}

// GET / - route by session state
pub async fn index(State(state): State<ApiState>, headers: HeaderMap) -> Redirect {
    if authenticate(&headers, &state.sessions).is_some() {
        Redirect::to("/market")
    } else {
        Redirect::to("/login")
    }
}

// GET /login - login form
pub async fn login_form() -> Html<String> {
    Html(login_page(None))
}

// POST /login - validate credentials, set the session cookie
pub async fn login(State(state): State<ApiState>, Form(form): Form<LoginForm>) -> Response {
    match state.sessions.login(&form.username, &form.password) {
        Ok(token) => {
            let cookie = format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, token);
            ([(header::SET_COOKIE, cookie)], Redirect::to("/market")).into_response()
        }
        Err(message) => Html(login_page(Some(&message))).into_response(),
    }
}

// GET /market - overview plus the full snapshot
pub async fn market(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let username = match authenticate(&headers, &state.sessions) {
        Some(username) => username,
        None => return Redirect::to("/login").into_response(),
    };

    let market_overview = get_overview(state.source.as_ref()).await;
    let market_stats = state.cache.market_snapshot().await;
    let total_stocks = market_stats.len();

    Json(json!({
        "username": username,
        "market_overview": market_overview,
        "market_stats": market_stats,
        "total_stocks": total_stocks,
        "last_update": Utc::now().format("%H:%M:%S").to_string(),
    }))
    .into_response()
}

// GET /statistics - snapshot plus ranked movers
pub async fn statistics(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let username = match authenticate(&headers, &state.sessions) {
        Some(username) => username,
        None => return Redirect::to("/login").into_response(),
    };

    let market_overview = get_overview(state.source.as_ref()).await;
    let market_stats = state.cache.market_snapshot().await;
    let (gainers, losers) = rank_movers(&market_stats, TOP_MOVERS);
    let total_stocks = market_stats.len();

    Json(json!({
        "username": username,
        "market_overview": market_overview,
        "market_stats": market_stats,
        "gainers": gainers,
        "losers": losers,
        "total_stocks": total_stocks,
        "last_update": Utc::now().format("%H:%M:%S").to_string(),
    }))
    .into_response()
}

// GET /logout - drop the session and clear the cookie
pub async fn logout(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    if let Some(token) = extract_session_from_headers(&headers) {
        state.sessions.logout(&token);
    }

    info!("Session ended, redirecting to login");
    let expired = format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE);
    ([(header::SET_COOKIE, expired)], Redirect::to("/login")).into_response()
}

pub fn create_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_form).post(login))
        .route("/market", get(market))
        .route("/statistics", get(statistics))
        .route("/logout", get(logout))
        .with_state(state)
}
