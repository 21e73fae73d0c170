use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AppUser::Table)
                    .if_not_exists()
                    .col(pk_auto(AppUser::Id))
                    .col(string_uniq(AppUser::Username))
                    .col(string_uniq(AppUser::Email))
                    .col(string(AppUser::PasswordHash))
                    .col(big_integer(AppUser::CreatedAt))
                    .col(big_integer(AppUser::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuthToken::Table)
                    .if_not_exists()
                    .col(string(AuthToken::Key).primary_key())
                    .col(integer_uniq(AuthToken::UserId))
                    .col(big_integer(AuthToken::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_token_user")
                            .from(AuthToken::Table, AuthToken::UserId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Film::Table)
                    .if_not_exists()
                    .col(pk_auto(Film::Id))
                    .col(string_null(Film::Name))
                    .col(string_null(Film::EnName))
                    .col(integer_null(Film::Year))
                    .col(boolean(Film::IsSeries).default(false))
                    .col(big_integer(Film::CreatedAt))
                    .col(big_integer(Film::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_film_year")
                    .table(Film::Table)
                    .col(Film::Year)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Film::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(AuthToken::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(AppUser::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum AppUser {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AuthToken {
    Table,
    Key,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Film {
    Table,
    Id,
    Name,
    EnName,
    Year,
    IsSeries,
    CreatedAt,
    UpdatedAt,
}
