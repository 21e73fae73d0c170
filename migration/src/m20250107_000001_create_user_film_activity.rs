use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserFilmActivity::Table)
                    .if_not_exists()
                    .col(pk_auto(UserFilmActivity::Id))
                    .col(integer(UserFilmActivity::UserId))
                    .col(integer(UserFilmActivity::FilmId))
                    .col(boolean(UserFilmActivity::IsPlanned).default(false))
                    .col(boolean(UserFilmActivity::IsWatched).default(false))
                    .col(small_integer_null(UserFilmActivity::Rating))
                    .col(boolean(UserFilmActivity::IsPublic).default(false))
                    .col(big_integer(UserFilmActivity::CreatedAt))
                    .col(big_integer(UserFilmActivity::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_user")
                            .from(UserFilmActivity::Table, UserFilmActivity::UserId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_film")
                            .from(UserFilmActivity::Table, UserFilmActivity::FilmId)
                            .to(Film::Table, Film::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_updated_at")
                    .table(UserFilmActivity::Table)
                    .col(UserFilmActivity::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WatchHistory::Table)
                    .if_not_exists()
                    .col(pk_auto(WatchHistory::Id))
                    .col(integer(WatchHistory::ActivityId))
                    .col(big_integer(WatchHistory::WatchedAt))
                    .col(string_null(WatchHistory::Comment))
                    .col(big_integer(WatchHistory::CreatedAt))
                    .col(big_integer(WatchHistory::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watch_history_activity")
                            .from(WatchHistory::Table, WatchHistory::ActivityId)
                            .to(UserFilmActivity::Table, UserFilmActivity::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_watch_history_activity")
                    .table(WatchHistory::Table)
                    .col(WatchHistory::ActivityId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(WatchHistory::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(UserFilmActivity::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum UserFilmActivity {
    Table,
    Id,
    UserId,
    FilmId,
    IsPlanned,
    IsWatched,
    Rating,
    IsPublic,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WatchHistory {
    Table,
    Id,
    ActivityId,
    WatchedAt,
    Comment,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AppUser {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Film {
    Table,
    Id,
}
