use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

use crate::entities::{app_user, film, user_film_activity, watch_history};

pub const RATING_MIN: i16 = 0;
pub const RATING_MAX: i16 = 10;
pub const HISTORY_COMMENT_MAX_LEN: usize = 1000;

pub(crate) fn now_millis() -> i64 {
    Timestamp::now().as_millisecond()
}

fn from_millis(ms: i64) -> Timestamp {
    Timestamp::from_millisecond(ms).unwrap_or(Timestamp::UNIX_EPOCH)
}

/// Distinguishes an absent key from an explicit `null`.
fn present<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(de).map(Some)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Timestamps {
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Timestamps {
    pub fn from_millis(created_at: i64, updated_at: i64) -> Self {
        Self { created_at: from_millis(created_at), updated_at: from_millis(updated_at) }
    }
}

/// Per-field validation messages, keyed by field name.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Ratings arrive as arbitrary JSON numbers so that out-of-range and
/// fractional values surface as field errors rather than decode failures.
fn check_rating(rating: &Option<Option<Number>>, errors: &mut FieldErrors) {
    let Some(Some(n)) = rating else {
        return;
    };
    match n.as_i64() {
        Some(r) if r < i64::from(RATING_MIN) => {
            errors.add("rating", format!("rating must be at least {RATING_MIN}"));
        },
        Some(r) if r > i64::from(RATING_MAX) => {
            errors.add("rating", format!("rating must be at most {RATING_MAX}"));
        },
        Some(_) => {},
        None if n.as_u64().is_some() => {
            errors.add("rating", format!("rating must be at most {RATING_MAX}"));
        },
        None => errors.add("rating", "rating must be a whole number"),
    }
}

/// Narrows a validated rating to its stored width.
fn stored_rating(rating: &Option<Option<Number>>) -> Option<Option<i16>> {
    rating.as_ref().map(|r| {
        r.as_ref()
            .and_then(Number::as_i64)
            .map(|v| v.clamp(i64::from(RATING_MIN), i64::from(RATING_MAX)) as i16)
    })
}

/// Payload of the status operation. Every field is optional; `rating` is
/// doubly optional so that `null` clears a stored rating.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusFields {
    pub is_planned: Option<bool>,
    pub is_watched: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Option<Number>>,
    pub is_public: Option<bool>,
    /// Annotates the watch-history row appended when the film is watched.
    pub comment: Option<String>,
}

impl StatusFields {
    pub fn sets_both_flags(&self) -> bool {
        self.is_planned == Some(true) && self.is_watched == Some(true)
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        check_rating(&self.rating, &mut errors);
        if let Some(comment) = &self.comment {
            if comment.chars().count() > HISTORY_COMMENT_MAX_LEN {
                errors.add(
                    "comment",
                    format!("comment must be at most {HISTORY_COMMENT_MAX_LEN} characters"),
                );
            }
        }
        errors.into_result()
    }

    /// The rating to store, if one was provided. Call after `validate`.
    pub fn rating(&self) -> Option<Option<i16>> {
        stored_rating(&self.rating)
    }

    /// Returns `current` with every provided field applied.
    pub fn merge(&self, current: &user_film_activity::Model) -> user_film_activity::Model {
        let mut next = current.clone();
        if let Some(v) = self.is_planned {
            next.is_planned = v;
        }
        if let Some(v) = self.is_watched {
            next.is_watched = v;
        }
        if let Some(v) = self.rating() {
            next.rating = v;
        }
        if let Some(v) = self.is_public {
            next.is_public = v;
        }
        next
    }
}

/// Payload of the secondary-attribute patch. The status flags are accepted by
/// the decoder only so their presence (even as `null`) can be rejected.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtraFields {
    #[serde(default, deserialize_with = "present")]
    pub is_planned: Option<Option<bool>>,
    #[serde(default, deserialize_with = "present")]
    pub is_watched: Option<Option<bool>>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Option<Number>>,
    pub is_public: Option<bool>,
}

impl ExtraFields {
    pub fn touches_status(&self) -> bool {
        self.is_planned.is_some() || self.is_watched.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.is_public.is_none()
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        check_rating(&self.rating, &mut errors);
        errors.into_result()
    }

    /// The rating to store, if one was provided. Call after `validate`.
    pub fn rating(&self) -> Option<Option<i16>> {
        stored_rating(&self.rating)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ListFilters {
    pub is_planned: Option<bool>,
    pub is_watched: Option<bool>,
}

/// Result of the status operation. Rejections travel on the error side.
#[derive(Clone, Debug, PartialEq)]
pub enum SetOutcome {
    Created(user_film_activity::Model),
    Updated(user_film_activity::Model),
    /// Redundant request; the stored record is returned untouched.
    Conflict { activity: user_film_activity::Model, detail: &'static str },
}

impl SetOutcome {
    pub fn activity(&self) -> &user_film_activity::Model {
        match self {
            SetOutcome::Created(a) | SetOutcome::Updated(a) => a,
            SetOutcome::Conflict { activity, .. } => activity,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ActivityView {
    pub id: i32,
    pub user_id: i32,
    pub film_id: i32,
    pub is_planned: bool,
    pub is_watched: bool,
    pub rating: Option<i16>,
    pub is_public: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl From<user_film_activity::Model> for ActivityView {
    fn from(m: user_film_activity::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            film_id: m.film_id,
            is_planned: m.is_planned,
            is_watched: m.is_watched,
            rating: m.rating,
            is_public: m.is_public,
            timestamps: Timestamps::from_millis(m.created_at, m.updated_at),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct HistoryView {
    pub id: i32,
    pub activity_id: i32,
    pub watched_at: Timestamp,
    pub comment: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl From<watch_history::Model> for HistoryView {
    fn from(m: watch_history::Model) -> Self {
        Self {
            id: m.id,
            activity_id: m.activity_id,
            watched_at: from_millis(m.watched_at),
            comment: m.comment,
            timestamps: Timestamps::from_millis(m.created_at, m.updated_at),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FilmView {
    pub id: i32,
    pub name: Option<String>,
    pub en_name: Option<String>,
    pub year: Option<i32>,
    pub is_series: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl From<film::Model> for FilmView {
    fn from(m: film::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            en_name: m.en_name,
            year: m.year,
            is_series: m.is_series,
            timestamps: Timestamps::from_millis(m.created_at, m.updated_at),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl From<app_user::Model> for UserView {
    fn from(m: app_user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            timestamps: Timestamps::from_millis(m.created_at, m.updated_at),
        }
    }
}
