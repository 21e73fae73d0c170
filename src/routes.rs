use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, accounts, activity,
    auth::AuthUser,
    catalog,
    error::{AppError, AppResult},
    models::{
        ActivityView, Credentials, ExtraFields, FilmView, HistoryView, ListFilters, NewUser,
        SetOutcome, StatusFields, UserView,
    },
};

pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let Json(user) = payload?;
    let created = accounts::register(&state.db, user).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> AppResult<Json<serde_json::Value>> {
    let Json(creds) = payload?;
    let key = accounts::login(&state.db, creds).await?;
    Ok(Json(json!({ "auth_token": key })))
}

pub async fn logout(State(state): State<Arc<AppState>>, user: AuthUser) -> AppResult<StatusCode> {
    accounts::logout(&state.db, &user.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_films(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> AppResult<Json<Vec<FilmView>>> {
    let films = catalog::list_films(&state.db).await?;
    Ok(Json(films.into_iter().map(FilmView::from).collect()))
}

pub async fn get_film(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(film_id): Path<i32>,
) -> AppResult<Json<FilmView>> {
    let film = catalog::find_film(&state.db, film_id).await?.ok_or(AppError::NotFound("film"))?;
    Ok(Json(film.into()))
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(film_id): Path<i32>,
    payload: Result<Json<StatusFields>, JsonRejection>,
) -> AppResult<Response> {
    let Json(fields) = payload?;
    let outcome = activity::set_status(&state.db, user.user_id, film_id, fields).await?;

    let resp = match outcome {
        SetOutcome::Created(a) => (StatusCode::CREATED, Json(ActivityView::from(a))).into_response(),
        SetOutcome::Updated(a) => (StatusCode::OK, Json(ActivityView::from(a))).into_response(),
        SetOutcome::Conflict { activity, detail } => (
            StatusCode::OK,
            Json(json!({ "detail": detail, "activity": ActivityView::from(activity) })),
        )
            .into_response(),
    };
    Ok(resp)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    user_id: Option<i32>,
    is_planned: Option<bool>,
    is_watched: Option<bool>,
}

pub async fn list_statuses(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<Vec<ActivityView>>> {
    let filters = ListFilters { is_planned: q.is_planned, is_watched: q.is_watched };
    let rows = activity::list_statuses(&state.db, user.user_id, q.user_id, filters).await?;
    Ok(Json(rows.into_iter().map(ActivityView::from).collect()))
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(film_id): Path<i32>,
) -> AppResult<Json<ActivityView>> {
    let row = activity::get_status(&state.db, user.user_id, film_id).await?;
    Ok(Json(row.into()))
}

pub async fn patch_extra(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(film_id): Path<i32>,
    payload: Result<Json<ExtraFields>, JsonRejection>,
) -> AppResult<Json<ActivityView>> {
    let Json(fields) = payload?;
    let row = activity::patch_extra(&state.db, user.user_id, film_id, fields).await?;
    Ok(Json(row.into()))
}

pub async fn delete_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(film_id): Path<i32>,
) -> AppResult<StatusCode> {
    activity::delete_status(&state.db, user.user_id, film_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(film_id): Path<i32>,
) -> AppResult<Json<Vec<HistoryView>>> {
    let rows = activity::list_history(&state.db, user.user_id, film_id).await?;
    Ok(Json(rows.into_iter().map(HistoryView::from).collect()))
}
