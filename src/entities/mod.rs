pub mod app_user;
pub mod auth_token;
pub mod film;
pub mod user_film_activity;
pub mod watch_history;
