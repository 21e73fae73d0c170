pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_accounts_and_films;
mod m20250107_000001_create_user_film_activity;
mod m20250109_000001_add_activity_unique;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_accounts_and_films::Migration),
            Box::new(m20250107_000001_create_user_film_activity::Migration),
            Box::new(m20250109_000001_add_activity_unique::Migration),
        ]
    }
}
