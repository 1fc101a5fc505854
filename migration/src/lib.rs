pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_subscriptions;
mod m20250301_000002_create_children_and_care_events;
mod m20250301_000003_create_admin_audit_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_subscriptions::Migration),
            Box::new(m20250301_000002_create_children_and_care_events::Migration),
            Box::new(m20250301_000003_create_admin_audit_logs::Migration),
        ]
    }
}
