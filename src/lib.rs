pub mod accounts;
pub mod activity;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = if state.config.cors_allow_any {
        CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/auth/users/", post(routes::register))
        .route("/auth/token/login/", post(routes::login))
        .route("/auth/token/logout/", post(routes::logout))
        .route("/films/", get(routes::list_films))
        .route("/films/{film_id}/", get(routes::get_film))
        .route("/user_activities/", get(routes::list_statuses))
        .route(
            "/user_activities/{film_id}/",
            post(routes::set_status)
                .get(routes::get_status)
                .patch(routes::patch_extra)
                .delete(routes::delete_status),
        )
        .route("/user_activities/{film_id}/history/", get(routes::list_history))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
