//! Read-only lookups against the film catalog.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QueryOrder};

use crate::entities::film;

pub async fn find_film<C: ConnectionTrait>(
    conn: &C,
    film_id: i32,
) -> Result<Option<film::Model>, DbErr> {
    film::Entity::find_by_id(film_id).one(conn).await
}

pub async fn list_films<C: ConnectionTrait>(conn: &C) -> Result<Vec<film::Model>, DbErr> {
    film::Entity::find()
        .order_by_asc(film::Column::Year)
        .order_by_asc(film::Column::Id)
        .all(conn)
        .await
}
