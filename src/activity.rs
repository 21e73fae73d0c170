//! The activity status manager: owns the single record describing one user's
//! relationship to one film, plus the watch history hanging off it.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait,
    sea_query::OnConflict,
};
use tracing::{debug, info};

use crate::{
    catalog,
    entities::{user_film_activity, watch_history},
    models::{ExtraFields, FieldErrors, ListFilters, SetOutcome, StatusFields, now_millis},
};

pub const BOTH_FLAGS: &str = "cannot set both planned and watched in one request";
pub const STATUS_IN_PATCH: &str = "use the status operation to change planned/watched";
pub const EMPTY_PATCH: &str = "no fields to update";
pub const ALREADY_PLANNED: &str = "film is already planned";

#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidRequest(&'static str),
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<FieldErrors> for ActivityError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

async fn find_activity<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    film_id: i32,
) -> Result<Option<user_film_activity::Model>, DbErr> {
    user_film_activity::Entity::find()
        .filter(user_film_activity::Column::UserId.eq(user_id))
        .filter(user_film_activity::Column::FilmId.eq(film_id))
        .one(conn)
        .await
}

async fn require_activity<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    film_id: i32,
) -> Result<user_film_activity::Model, ActivityError> {
    find_activity(conn, user_id, film_id).await?.ok_or(ActivityError::NotFound("activity"))
}

async fn record_watch<C: ConnectionTrait>(
    conn: &C,
    activity_id: i32,
    comment: Option<String>,
    now: i64,
) -> Result<watch_history::Model, DbErr> {
    watch_history::ActiveModel {
        id: Default::default(),
        activity_id: Set(activity_id),
        watched_at: Set(now),
        comment: Set(comment),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// Creates or updates the caller's record for `film_id`.
///
/// The transaction opens with the insert so SQLite takes its write lock
/// before any read; a concurrent create for the same pair lands on the
/// unique index and this request continues as an update.
pub async fn set_status(
    db: &DatabaseConnection,
    user_id: i32,
    film_id: i32,
    fields: StatusFields,
) -> Result<SetOutcome, ActivityError> {
    if fields.sets_both_flags() {
        return Err(ActivityError::InvalidRequest(BOTH_FLAGS));
    }
    fields.validate()?;

    if catalog::find_film(db, film_id).await?.is_none() {
        return Err(ActivityError::NotFound("film"));
    }

    let txn = db.begin().await?;
    let outcome = apply_status(&txn, user_id, film_id, &fields).await?;
    txn.commit().await?;

    match &outcome {
        SetOutcome::Created(a) => info!(user_id, film_id, activity_id = a.id, "activity created"),
        SetOutcome::Updated(a) => info!(user_id, film_id, activity_id = a.id, "activity updated"),
        SetOutcome::Conflict { activity, detail } => {
            debug!(user_id, film_id, activity_id = activity.id, detail, "redundant status request")
        },
    }

    Ok(outcome)
}

async fn apply_status<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    film_id: i32,
    fields: &StatusFields,
) -> Result<SetOutcome, ActivityError> {
    let now = now_millis();
    let watched = fields.is_watched == Some(true);

    let candidate = user_film_activity::ActiveModel {
        id: Default::default(),
        user_id: Set(user_id),
        film_id: Set(film_id),
        is_planned: Set(fields.is_planned.unwrap_or(false)),
        is_watched: Set(fields.is_watched.unwrap_or(false)),
        rating: Set(fields.rating().flatten()),
        is_public: Set(fields.is_public.unwrap_or(false)),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let inserted = user_film_activity::Entity::insert(candidate)
        .on_conflict(
            OnConflict::columns([
                user_film_activity::Column::UserId,
                user_film_activity::Column::FilmId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    let current = require_activity(conn, user_id, film_id).await?;
    if inserted > 0 {
        if watched {
            record_watch(conn, current.id, fields.comment.clone(), now).await?;
        }
        return Ok(SetOutcome::Created(current));
    }

    if fields.is_planned == Some(true) && current.is_planned {
        return Ok(SetOutcome::Conflict { activity: current, detail: ALREADY_PLANNED });
    }

    if watched {
        if current.is_watched {
            debug!(activity_id = current.id, "re-watch recorded");
        }
        record_watch(conn, current.id, fields.comment.clone(), now).await?;
    }

    let next = fields.merge(&current);
    if next == current {
        // A bare re-watch only appends history.
        return Ok(SetOutcome::Updated(current));
    }

    let mut active: user_film_activity::ActiveModel = current.into();
    active.is_planned = Set(next.is_planned);
    active.is_watched = Set(next.is_watched);
    active.rating = Set(next.rating);
    active.is_public = Set(next.is_public);
    active.updated_at = Set(now);
    Ok(SetOutcome::Updated(active.update(conn).await?))
}

/// Updates rating and visibility on an existing record.
pub async fn patch_extra(
    db: &DatabaseConnection,
    user_id: i32,
    film_id: i32,
    fields: ExtraFields,
) -> Result<user_film_activity::Model, ActivityError> {
    if fields.touches_status() {
        return Err(ActivityError::InvalidRequest(STATUS_IN_PATCH));
    }
    if fields.is_empty() {
        return Err(ActivityError::InvalidRequest(EMPTY_PATCH));
    }
    fields.validate()?;

    let current = require_activity(db, user_id, film_id).await?;
    let mut active: user_film_activity::ActiveModel = current.into();
    if let Some(rating) = fields.rating() {
        active.rating = Set(rating);
    }
    if let Some(is_public) = fields.is_public {
        active.is_public = Set(is_public);
    }
    active.updated_at = Set(now_millis());

    let updated = active.update(db).await?;
    info!(user_id, film_id, activity_id = updated.id, "activity patched");
    Ok(updated)
}

/// Lists `target_user`'s records (the viewer's own when `None`). Other users'
/// private records are never returned.
pub async fn list_statuses(
    db: &DatabaseConnection,
    viewer: i32,
    target_user: Option<i32>,
    filters: ListFilters,
) -> Result<Vec<user_film_activity::Model>, ActivityError> {
    let target = target_user.unwrap_or(viewer);

    let mut query =
        user_film_activity::Entity::find().filter(user_film_activity::Column::UserId.eq(target));
    if target != viewer {
        query = query.filter(user_film_activity::Column::IsPublic.eq(true));
    }
    if let Some(v) = filters.is_planned {
        query = query.filter(user_film_activity::Column::IsPlanned.eq(v));
    }
    if let Some(v) = filters.is_watched {
        query = query.filter(user_film_activity::Column::IsWatched.eq(v));
    }

    Ok(query
        .order_by_desc(user_film_activity::Column::CreatedAt)
        .order_by_desc(user_film_activity::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_status(
    db: &DatabaseConnection,
    user_id: i32,
    film_id: i32,
) -> Result<user_film_activity::Model, ActivityError> {
    require_activity(db, user_id, film_id).await
}

pub async fn delete_status(
    db: &DatabaseConnection,
    user_id: i32,
    film_id: i32,
) -> Result<(), ActivityError> {
    let txn = db.begin().await?;
    let owned = user_film_activity::Entity::find()
        .select_only()
        .column(user_film_activity::Column::Id)
        .filter(user_film_activity::Column::UserId.eq(user_id))
        .filter(user_film_activity::Column::FilmId.eq(film_id))
        .into_query();

    // Writes only, so the lock is taken on the first statement.
    let history = watch_history::Entity::delete_many()
        .filter(watch_history::Column::ActivityId.in_subquery(owned))
        .exec(&txn)
        .await?;
    let removed = user_film_activity::Entity::delete_many()
        .filter(user_film_activity::Column::UserId.eq(user_id))
        .filter(user_film_activity::Column::FilmId.eq(film_id))
        .exec(&txn)
        .await?;
    if removed.rows_affected == 0 {
        return Err(ActivityError::NotFound("activity"));
    }
    txn.commit().await?;

    info!(user_id, film_id, watches = history.rows_affected, "activity deleted");
    Ok(())
}

/// The caller's watch events for `film_id`, newest first.
pub async fn list_history(
    db: &DatabaseConnection,
    user_id: i32,
    film_id: i32,
) -> Result<Vec<watch_history::Model>, ActivityError> {
    let activity = require_activity(db, user_id, film_id).await?;
    Ok(watch_history::Entity::find()
        .filter(watch_history::Column::ActivityId.eq(activity.id))
        .order_by_desc(watch_history::Column::WatchedAt)
        .order_by_desc(watch_history::Column::Id)
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::{
        db::connect_and_migrate,
        entities::{app_user, film},
    };

    struct Fixture {
        db: DatabaseConnection,
        alice: i32,
        bob: i32,
        film: i32,
        other_film: i32,
    }

    async fn add_user(db: &DatabaseConnection, name: &str) -> i32 {
        app_user::ActiveModel {
            username: Set(name.to_string()),
            email: Set(format!("{name}@example.com")),
            password_hash: Set(String::new()),
            created_at: Set(0),
            updated_at: Set(0),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    async fn add_film(db: &DatabaseConnection, name: &str) -> i32 {
        film::ActiveModel {
            name: Set(Some(name.to_string())),
            en_name: Set(None),
            year: Set(None),
            is_series: Set(false),
            created_at: Set(0),
            updated_at: Set(0),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    async fn fixture() -> Fixture {
        let db = connect_and_migrate("sqlite::memory:", 1).await.unwrap();
        let alice = add_user(&db, "alice").await;
        let bob = add_user(&db, "bob").await;
        let film_id = add_film(&db, "Stalker").await;
        let other_film = add_film(&db, "Solaris").await;
        Fixture { db, alice, bob, film: film_id, other_film }
    }

    fn planned() -> StatusFields {
        StatusFields { is_planned: Some(true), ..Default::default() }
    }

    fn watched() -> StatusFields {
        StatusFields { is_watched: Some(true), ..Default::default() }
    }

    async fn history_len(db: &DatabaseConnection) -> u64 {
        watch_history::Entity::find().count(db).await.unwrap()
    }

    #[tokio::test]
    async fn first_plan_creates_with_defaults() {
        let f = fixture().await;
        let outcome = set_status(&f.db, f.alice, f.film, planned()).await.unwrap();

        let SetOutcome::Created(created) = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        assert!(created.is_planned);
        assert!(!created.is_watched);
        assert_eq!(created.rating, None);
        assert!(!created.is_public);

        let stored = get_status(&f.db, f.alice, f.film).await.unwrap();
        assert_eq!(stored, created);
    }

    #[tokio::test]
    async fn watching_a_planned_film_updates_in_place() {
        let f = fixture().await;
        let created = set_status(&f.db, f.alice, f.film, planned()).await.unwrap();
        let outcome = set_status(&f.db, f.alice, f.film, watched()).await.unwrap();

        let SetOutcome::Updated(updated) = outcome else {
            panic!("expected Updated, got {outcome:?}");
        };
        assert_eq!(updated.id, created.activity().id);
        assert!(updated.is_planned);
        assert!(updated.is_watched);
        assert_eq!(history_len(&f.db).await, 1);
    }

    #[tokio::test]
    async fn replanning_is_a_soft_conflict_without_a_write() {
        let f = fixture().await;
        let first = set_status(&f.db, f.alice, f.film, planned()).await.unwrap();
        let second = set_status(&f.db, f.alice, f.film, planned()).await.unwrap();

        match second {
            SetOutcome::Conflict { activity, detail } => {
                assert_eq!(detail, ALREADY_PLANNED);
                assert_eq!(activity.updated_at, first.activity().updated_at);
            },
            other => panic!("expected Conflict, got {other:?}"),
        }
        let stored = get_status(&f.db, f.alice, f.film).await.unwrap();
        assert_eq!(stored.updated_at, first.activity().updated_at);
    }

    #[tokio::test]
    async fn replanning_ignores_the_other_fields_it_carries() {
        let f = fixture().await;
        let first = set_status(&f.db, f.alice, f.film, planned()).await.unwrap();
        let rated = StatusFields { rating: Some(Some(5.into())), is_public: Some(true), ..planned() };

        let outcome = set_status(&f.db, f.alice, f.film, rated).await.unwrap();
        assert!(matches!(outcome, SetOutcome::Conflict { detail: ALREADY_PLANNED, .. }));

        let stored = get_status(&f.db, f.alice, f.film).await.unwrap();
        assert_eq!(stored, *first.activity());
        assert_eq!(stored.rating, None);
        assert!(!stored.is_public);
    }

    #[tokio::test]
    async fn both_flags_are_rejected_and_nothing_changes() {
        let f = fixture().await;
        let both = StatusFields { is_planned: Some(true), is_watched: Some(true), ..Default::default() };

        let err = set_status(&f.db, f.alice, f.film, both.clone()).await.unwrap_err();
        assert!(matches!(err, ActivityError::InvalidRequest(BOTH_FLAGS)));
        assert!(matches!(
            get_status(&f.db, f.alice, f.film).await,
            Err(ActivityError::NotFound(_))
        ));

        let existing = set_status(&f.db, f.alice, f.film, watched()).await.unwrap();
        let err = set_status(&f.db, f.alice, f.film, both).await.unwrap_err();
        assert!(matches!(err, ActivityError::InvalidRequest(_)));
        assert_eq!(get_status(&f.db, f.alice, f.film).await.unwrap(), *existing.activity());
    }

    #[tokio::test]
    async fn unknown_film_is_not_found() {
        let f = fixture().await;
        let err = set_status(&f.db, f.alice, 9_999, planned()).await.unwrap_err();
        assert!(matches!(err, ActivityError::NotFound("film")));
    }

    #[tokio::test]
    async fn out_of_range_rating_fails_validation() {
        let f = fixture().await;
        let fields = StatusFields { rating: Some(Some(12.into())), ..Default::default() };
        let err = set_status(&f.db, f.alice, f.film, fields).await.unwrap_err();
        let ActivityError::Validation(errors) = err else {
            panic!("expected Validation, got {err:?}");
        };
        assert!(errors.get("rating").is_some());
    }

    #[tokio::test]
    async fn created_record_matches_fields_over_defaults() {
        let f = fixture().await;
        let fields = StatusFields {
            is_watched: Some(true),
            rating: Some(Some(9.into())),
            is_public: Some(true),
            ..Default::default()
        };
        set_status(&f.db, f.alice, f.film, fields).await.unwrap();

        let stored = get_status(&f.db, f.alice, f.film).await.unwrap();
        assert!(!stored.is_planned);
        assert!(stored.is_watched);
        assert_eq!(stored.rating, Some(9));
        assert!(stored.is_public);
    }

    #[tokio::test]
    async fn rewatch_appends_history_without_touching_the_record() {
        let f = fixture().await;
        let first = set_status(&f.db, f.alice, f.film, watched()).await.unwrap();
        let again = StatusFields { comment: Some("better the second time".into()), ..watched() };
        let second = set_status(&f.db, f.alice, f.film, again).await.unwrap();

        assert!(matches!(second, SetOutcome::Updated(_)));
        assert_eq!(second.activity(), first.activity());

        let history = list_history(&f.db, f.alice, f.film).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].comment.as_deref(), Some("better the second time"));
        assert_eq!(history[1].comment, None);
    }

    #[tokio::test]
    async fn patch_requires_an_existing_record() {
        let f = fixture().await;
        let fields = ExtraFields { rating: Some(Some(7.into())), ..Default::default() };
        let err = patch_extra(&f.db, f.alice, f.film, fields).await.unwrap_err();
        assert!(matches!(err, ActivityError::NotFound("activity")));
    }

    #[tokio::test]
    async fn patch_rejects_status_flags_and_empty_payloads() {
        let f = fixture().await;
        set_status(&f.db, f.alice, f.film, watched()).await.unwrap();

        let flags = ExtraFields { is_watched: Some(Some(true)), ..Default::default() };
        let err = patch_extra(&f.db, f.alice, f.film, flags.clone()).await.unwrap_err();
        assert!(matches!(err, ActivityError::InvalidRequest(STATUS_IN_PATCH)));

        let err = patch_extra(&f.db, f.bob, f.film, flags).await.unwrap_err();
        assert!(matches!(err, ActivityError::InvalidRequest(STATUS_IN_PATCH)));

        let err = patch_extra(&f.db, f.alice, f.film, ExtraFields::default()).await.unwrap_err();
        assert!(matches!(err, ActivityError::InvalidRequest(EMPTY_PATCH)));
    }

    #[tokio::test]
    async fn patch_rejects_null_status_flags() {
        let f = fixture().await;
        let before = set_status(&f.db, f.alice, f.film, watched()).await.unwrap();

        let nulled: ExtraFields = serde_json::from_str(r#"{"is_planned": null}"#).unwrap();
        let err = patch_extra(&f.db, f.alice, f.film, nulled).await.unwrap_err();
        assert!(matches!(err, ActivityError::InvalidRequest(STATUS_IN_PATCH)));
        assert_eq!(get_status(&f.db, f.alice, f.film).await.unwrap(), *before.activity());
    }

    #[tokio::test]
    async fn patch_is_idempotent() {
        let f = fixture().await;
        set_status(&f.db, f.alice, f.film, watched()).await.unwrap();
        let rate = ExtraFields { rating: Some(Some(7.into())), ..Default::default() };

        let once = patch_extra(&f.db, f.alice, f.film, rate.clone()).await.unwrap();
        let twice = patch_extra(&f.db, f.alice, f.film, rate).await.unwrap();
        assert_eq!(once.rating, Some(7));
        assert_eq!(
            (twice.is_planned, twice.is_watched, twice.rating, twice.is_public),
            (once.is_planned, once.is_watched, once.rating, once.is_public)
        );
    }

    #[tokio::test]
    async fn patch_can_clear_rating() {
        let f = fixture().await;
        let fields = StatusFields { is_watched: Some(true), rating: Some(Some(3.into())), ..Default::default() };
        set_status(&f.db, f.alice, f.film, fields).await.unwrap();

        let clear = ExtraFields { rating: Some(None), ..Default::default() };
        let updated = patch_extra(&f.db, f.alice, f.film, clear).await.unwrap();
        assert_eq!(updated.rating, None);
        assert!(updated.is_watched);
    }

    #[tokio::test]
    async fn other_users_see_only_public_records() {
        let f = fixture().await;
        let public = StatusFields { is_watched: Some(true), is_public: Some(true), ..Default::default() };
        set_status(&f.db, f.bob, f.film, public).await.unwrap();
        set_status(&f.db, f.bob, f.other_film, watched()).await.unwrap();

        let filters = ListFilters { is_watched: Some(true), ..Default::default() };
        let seen = list_statuses(&f.db, f.alice, Some(f.bob), filters).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].film_id, f.film);

        let own = list_statuses(&f.db, f.bob, None, filters).await.unwrap();
        assert_eq!(own.len(), 2);
    }

    #[tokio::test]
    async fn listing_filters_and_orders_newest_first() {
        let f = fixture().await;
        set_status(&f.db, f.alice, f.film, planned()).await.unwrap();
        set_status(&f.db, f.alice, f.other_film, watched()).await.unwrap();

        let all = list_statuses(&f.db, f.alice, None, ListFilters::default()).await.unwrap();
        let films: Vec<_> = all.iter().map(|a| a.film_id).collect();
        assert_eq!(films, [f.other_film, f.film]);

        let filters = ListFilters { is_planned: Some(true), ..Default::default() };
        let planned_only = list_statuses(&f.db, f.alice, None, filters).await.unwrap();
        assert_eq!(planned_only.len(), 1);
        assert_eq!(planned_only[0].film_id, f.film);
    }

    #[tokio::test]
    async fn delete_removes_record_and_history() {
        let f = fixture().await;
        set_status(&f.db, f.alice, f.film, watched()).await.unwrap();
        assert_eq!(history_len(&f.db).await, 1);

        delete_status(&f.db, f.alice, f.film).await.unwrap();
        assert!(matches!(
            get_status(&f.db, f.alice, f.film).await,
            Err(ActivityError::NotFound(_))
        ));
        assert_eq!(history_len(&f.db).await, 0);

        let err = delete_status(&f.db, f.alice, f.film).await.unwrap_err();
        assert!(matches!(err, ActivityError::NotFound("activity")));
    }

    async fn file_backed(dir: &tempfile::TempDir) -> DatabaseConnection {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("filmlog.db").display());
        connect_and_migrate(&url, 8).await.unwrap()
    }

    async fn race(
        db: &DatabaseConnection,
        user_id: i32,
        film_ids: &[i32],
        fields: StatusFields,
    ) -> Vec<Result<SetOutcome, ActivityError>> {
        let handles: Vec<_> = film_ids
            .iter()
            .map(|&film_id| {
                let db = db.clone();
                let fields = fields.clone();
                tokio::spawn(async move { set_status(&db, user_id, film_id, fields).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_watches_share_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_backed(&dir).await;
        let alice = add_user(&db, "alice").await;
        let film_id = add_film(&db, "Mirror").await;

        let results = race(&db, alice, &[film_id; 8], watched()).await;
        let outcomes: Vec<SetOutcome> = results.into_iter().map(Result::unwrap).collect();

        let created = outcomes.iter().filter(|o| matches!(o, SetOutcome::Created(_))).count();
        assert_eq!(created, 1);
        assert!(outcomes.iter().all(|o| !matches!(o, SetOutcome::Conflict { .. })));

        let rows = user_film_activity::Entity::find().count(&db).await.unwrap();
        assert_eq!(rows, 1);
        assert_eq!(history_len(&db).await, 8);
        let stored = get_status(&db, alice, film_id).await.unwrap();
        assert!(outcomes.iter().all(|o| o.activity().id == stored.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_plans_create_once_then_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_backed(&dir).await;
        let alice = add_user(&db, "alice").await;
        let film_id = add_film(&db, "Nostalghia").await;

        let results = race(&db, alice, &[film_id; 8], planned()).await;
        let outcomes: Vec<SetOutcome> = results.into_iter().map(Result::unwrap).collect();

        let created = outcomes.iter().filter(|o| matches!(o, SetOutcome::Created(_))).count();
        let conflicts = outcomes
            .iter()
            .filter(|o| matches!(o, SetOutcome::Conflict { detail: ALREADY_PLANNED, .. }))
            .count();
        assert_eq!((created, conflicts), (1, 7));
        assert_eq!(user_film_activity::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_and_deletes_do_not_lock_out() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_backed(&dir).await;
        let alice = add_user(&db, "alice").await;
        let mut films = Vec::new();
        for name in ["Ivan's Childhood", "Andrei Rublev", "The Sacrifice", "Solaris"] {
            films.push(add_film(&db, name).await);
        }

        for result in race(&db, alice, &films, watched()).await {
            assert!(matches!(result, Ok(SetOutcome::Created(_))));
        }

        let handles: Vec<_> = films
            .iter()
            .map(|&film_id| {
                let db = db.clone();
                tokio::spawn(async move { delete_status(&db, alice, film_id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(user_film_activity::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(history_len(&db).await, 0);
    }

    #[tokio::test]
    async fn records_are_scoped_per_user() {
        let f = fixture().await;
        set_status(&f.db, f.alice, f.film, planned()).await.unwrap();
        let outcome = set_status(&f.db, f.bob, f.film, planned()).await.unwrap();
        assert!(matches!(outcome, SetOutcome::Created(_)));
    }
}
