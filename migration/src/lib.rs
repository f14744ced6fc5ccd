pub use sea_orm_migration::prelude::*;

mod m20260215_000001_create_partners;
mod m20260215_000002_create_leads;
mod m20260215_000003_create_commissions;
mod m20260215_000004_create_payments;
mod m20260215_000005_create_messages;
mod m20260215_000006_create_announcement_reads;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260215_000001_create_partners::Migration),
      Box::new(m20260215_000002_create_leads::Migration),
      Box::new(m20260215_000003_create_commissions::Migration),
      Box::new(m20260215_000004_create_payments::Migration),
      Box::new(m20260215_000005_create_messages::Migration),
      Box::new(m20260215_000006_create_announcement_reads::Migration),
    ]
  }
}
