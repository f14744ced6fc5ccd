//! Shared test utilities for database setup

#[cfg(test)]
pub mod test_db {
  use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema,
  };

  use crate::entity::*;

  /// Creates an in-memory SQLite database with all required tables. The
  /// unique index on `commissions.lead_id` comes from the entity
  /// definition, so tests exercise the real idempotency constraint.
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    let stmt = schema.create_table_from_entity(partner::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(lead::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(commission::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(payment::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(message::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(announcement_read::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
  }
}

#[cfg(test)]
pub mod fixtures {
  use sea_orm::{ActiveModelTrait, DatabaseConnection, NotSet, Set};
  use uuid::Uuid;

  use crate::entity::*;

  pub async fn partner(
    db: &DatabaseConnection,
    user_type: UserType,
    created_at: chrono::NaiveDateTime,
  ) -> partner::Model {
    partner::ActiveModel {
      user_id: Set(Uuid::new_v4()),
      full_name: Set("Jean Dupont".into()),
      user_type: Set(user_type),
      email: Set("jean@example.com".into()),
      phone: Set("0601020304".into()),
      city: Set("Toulon".into()),
      siret: Set(match user_type {
        UserType::Business => Some("12345678900011".into()),
        UserType::Individual => None,
      }),
      gdpr_consent_date: Set(created_at),
      created_at: Set(created_at),
      updated_at: Set(created_at),
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn lead(
    db: &DatabaseConnection,
    partner_id: Uuid,
    status: LeadStatus,
    created_at: chrono::NaiveDateTime,
  ) -> lead::Model {
    lead::ActiveModel {
      id: NotSet,
      user_id: Set(partner_id),
      prospect_name: Set("Marie Martin".into()),
      prospect_phone: Set("0605060708".into()),
      prospect_email: Set("marie@example.com".into()),
      prospect_city: Set(Some("Hyères".into())),
      notes: Set(None),
      status: Set(status),
      amount_ht_cents: Set(None),
      created_at: Set(created_at),
      updated_at: Set(created_at),
    }
    .insert(db)
    .await
    .unwrap()
  }
}
