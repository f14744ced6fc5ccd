use sea_orm::{DbErr, sea_query::{Expr, OnConflict}};

use crate::{
  entity::{
    MessageType, SenderType, announcement_read, message, partner,
  },
  prelude::*,
};

pub struct Message<'a> {
  db: &'a DatabaseConnection,
}

pub struct AnnouncementView {
  pub message: message::Model,
  pub is_read: bool,
}

pub struct Inbox {
  pub announcements: Vec<AnnouncementView>,
  pub private_messages: Vec<message::Model>,
  pub unread_count: u64,
}

impl<'a> Message<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn insert(
    &self,
    sender_id: Uuid,
    sender_type: SenderType,
    recipient_id: Option<Uuid>,
    message_type: MessageType,
    subject: String,
    content: String,
  ) -> Result<message::Model> {
    let now = Utc::now().naive_utc();
    Ok(
      message::ActiveModel {
        id: NotSet,
        sender_id: Set(sender_id),
        sender_type: Set(sender_type),
        recipient_id: Set(recipient_id),
        message_type: Set(message_type),
        subject: Set(subject),
        content: Set(content),
        is_read: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
      }
      .insert(self.db)
      .await?,
    )
  }

  /// Broadcast to every partner; per-partner read state is created lazily.
  pub async fn send_announcement(
    &self,
    admin_id: Uuid,
    subject: String,
    content: String,
  ) -> Result<message::Model> {
    self
      .insert(
        admin_id,
        SenderType::Admin,
        None,
        MessageType::Announcement,
        subject,
        content,
      )
      .await
  }

  pub async fn send_private_from_admin(
    &self,
    admin_id: Uuid,
    recipient_id: Uuid,
    subject: String,
    content: String,
  ) -> Result<message::Model> {
    partner::Entity::find_by_id(recipient_id)
      .one(self.db)
      .await?
      .ok_or(Error::PartnerNotFound)?;

    self
      .insert(
        admin_id,
        SenderType::Admin,
        Some(recipient_id),
        MessageType::Private,
        subject,
        content,
      )
      .await
  }

  pub async fn send_private_from_partner(
    &self,
    partner_id: Uuid,
    recipient_id: Uuid,
    subject: String,
    content: String,
  ) -> Result<message::Model> {
    self
      .insert(
        partner_id,
        SenderType::Apporteur,
        Some(recipient_id),
        MessageType::Private,
        subject,
        content,
      )
      .await
  }

  /// A partner's view: announcements they have not deleted (with their
  /// read marker), private traffic in both directions, and the number of
  /// unread items.
  pub async fn inbox(&self, partner_id: Uuid) -> Result<Inbox> {
    let announcements = message::Entity::find()
      .filter(message::Column::MessageType.eq(MessageType::Announcement))
      .order_by_desc(message::Column::CreatedAt)
      .all(self.db)
      .await?;

    let reads: HashMap<i32, announcement_read::Model> =
      announcement_read::Entity::find()
        .filter(announcement_read::Column::UserId.eq(partner_id))
        .all(self.db)
        .await?
        .into_iter()
        .map(|read| (read.message_id, read))
        .collect();

    let announcements: Vec<AnnouncementView> = announcements
      .into_iter()
      .filter_map(|message| {
        let read = reads.get(&message.id);
        if read.is_some_and(|r| r.is_deleted) {
          return None;
        }
        Some(AnnouncementView {
          is_read: read.is_some_and(|r| r.is_read),
          message,
        })
      })
      .collect();

    let private_messages = message::Entity::find()
      .filter(message::Column::MessageType.eq(MessageType::Private))
      .filter(
        message::Column::RecipientId
          .eq(partner_id)
          .or(message::Column::SenderId.eq(partner_id)),
      )
      .order_by_desc(message::Column::CreatedAt)
      .all(self.db)
      .await?;

    let unread_announcements =
      announcements.iter().filter(|view| !view.is_read).count() as u64;
    let unread_private = private_messages
      .iter()
      .filter(|m| m.recipient_id == Some(partner_id) && !m.is_read)
      .count() as u64;

    Ok(Inbox {
      announcements,
      private_messages,
      unread_count: unread_announcements + unread_private,
    })
  }

  pub async fn mark_announcement_read(
    &self,
    partner_id: Uuid,
    message_id: i32,
  ) -> Result<()> {
    let message = message::Entity::find_by_id(message_id)
      .one(self.db)
      .await?
      .ok_or(Error::MessageNotFound)?;
    if message.message_type != MessageType::Announcement {
      return Err(Error::InvalidArgs(
        "Ce message n'est pas une annonce".into(),
      ));
    }

    let insert = announcement_read::Entity::insert(
      announcement_read::ActiveModel {
        user_id: Set(partner_id),
        message_id: Set(message_id),
        is_read: Set(true),
        is_deleted: Set(false),
        read_at: Set(Utc::now().naive_utc()),
      },
    )
    .on_conflict(
      OnConflict::columns([
        announcement_read::Column::UserId,
        announcement_read::Column::MessageId,
      ])
      .do_nothing()
      .to_owned(),
    )
    .exec(self.db)
    .await;

    match insert {
      Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
      Err(err) => Err(err.into()),
    }
  }

  /// Mark a private message read; only its recipient may.
  pub async fn mark_private_read(
    &self,
    partner_id: Uuid,
    message_id: i32,
  ) -> Result<()> {
    let result = message::Entity::update_many()
      .col_expr(message::Column::IsRead, Expr::value(true))
      .col_expr(
        message::Column::UpdatedAt,
        Expr::value(Utc::now().naive_utc()),
      )
      .filter(message::Column::Id.eq(message_id))
      .filter(message::Column::RecipientId.eq(partner_id))
      .filter(message::Column::MessageType.eq(MessageType::Private))
      .exec(self.db)
      .await?;

    if result.rows_affected == 0 {
      return Err(Error::MessageNotFound);
    }
    Ok(())
  }

  /// Delete a message from the caller's view. Announcements are shared, so
  /// deletion is a per-partner tombstone; private messages are hard-deleted
  /// by either party.
  pub async fn delete_for_user(
    &self,
    partner_id: Uuid,
    message_id: i32,
  ) -> Result<()> {
    let message = message::Entity::find_by_id(message_id)
      .one(self.db)
      .await?
      .ok_or(Error::MessageNotFound)?;

    match message.message_type {
      MessageType::Announcement => {
        announcement_read::Entity::insert(announcement_read::ActiveModel {
          user_id: Set(partner_id),
          message_id: Set(message_id),
          is_read: Set(true),
          is_deleted: Set(true),
          read_at: Set(Utc::now().naive_utc()),
        })
        .on_conflict(
          OnConflict::columns([
            announcement_read::Column::UserId,
            announcement_read::Column::MessageId,
          ])
          .update_columns([
            announcement_read::Column::IsDeleted,
            announcement_read::Column::IsRead,
          ])
          .to_owned(),
        )
        .exec(self.db)
        .await?;
        Ok(())
      }
      MessageType::Private => {
        if message.sender_id != partner_id
          && message.recipient_id != Some(partner_id)
        {
          return Err(Error::Forbidden);
        }
        message::Entity::delete_by_id(message_id).exec(self.db).await?;
        Ok(())
      }
    }
  }

  /// Private messages received by the admin, with the sending partner's
  /// profile when it still exists.
  pub async fn admin_received(
    &self,
    admin_id: Uuid,
  ) -> Result<Vec<(message::Model, Option<partner::Model>)>> {
    Ok(
      message::Entity::find()
        .filter(message::Column::MessageType.eq(MessageType::Private))
        .filter(message::Column::RecipientId.eq(admin_id))
        .order_by_desc(message::Column::CreatedAt)
        .find_also_related(partner::Entity)
        .all(self.db)
        .await?,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::UserType,
    sv::test_utils::{fixtures, test_db},
  };

  #[tokio::test]
  async fn test_announcement_read_and_unread_count() {
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Individual, now).await;
    let admin_id = Uuid::new_v4();
    let sv = Message::new(&db);

    let announcement = sv
      .send_announcement(admin_id, "Info".into(), "Nouvelle grille".into())
      .await
      .unwrap();

    let inbox = sv.inbox(partner.user_id).await.unwrap();
    assert_eq!(inbox.announcements.len(), 1);
    assert!(!inbox.announcements[0].is_read);
    assert_eq!(inbox.unread_count, 1);

    sv.mark_announcement_read(partner.user_id, announcement.id)
      .await
      .unwrap();
    // Marking twice is fine
    sv.mark_announcement_read(partner.user_id, announcement.id)
      .await
      .unwrap();

    let inbox = sv.inbox(partner.user_id).await.unwrap();
    assert!(inbox.announcements[0].is_read);
    assert_eq!(inbox.unread_count, 0);
  }

  #[tokio::test]
  async fn test_announcement_deletion_is_per_partner() {
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();
    let alice = fixtures::partner(&db, UserType::Individual, now).await;
    let bob = fixtures::partner(&db, UserType::Business, now).await;
    let sv = Message::new(&db);

    let announcement = sv
      .send_announcement(Uuid::new_v4(), "Info".into(), "Contenu".into())
      .await
      .unwrap();

    sv.delete_for_user(alice.user_id, announcement.id).await.unwrap();

    assert!(sv.inbox(alice.user_id).await.unwrap().announcements.is_empty());
    assert_eq!(sv.inbox(bob.user_id).await.unwrap().announcements.len(), 1);
    // The shared row itself is still there
    assert_eq!(message::Entity::find().count(&db).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_private_message_flow() {
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Individual, now).await;
    let admin_id = Uuid::new_v4();
    let sv = Message::new(&db);

    let to_partner = sv
      .send_private_from_admin(
        admin_id,
        partner.user_id,
        "Votre dossier".into(),
        "Merci de rappeler".into(),
      )
      .await
      .unwrap();
    sv.send_private_from_partner(
      partner.user_id,
      admin_id,
      "Re: Votre dossier".into(),
      "Je rappelle demain".into(),
    )
    .await
    .unwrap();

    let inbox = sv.inbox(partner.user_id).await.unwrap();
    assert_eq!(inbox.private_messages.len(), 2);
    // Only the received one counts as unread
    assert_eq!(inbox.unread_count, 1);

    sv.mark_private_read(partner.user_id, to_partner.id).await.unwrap();
    assert_eq!(sv.inbox(partner.user_id).await.unwrap().unread_count, 0);

    let received = sv.admin_received(admin_id).await.unwrap();
    assert_eq!(received.len(), 1);
    let sender = received[0].1.as_ref().unwrap();
    assert_eq!(sender.user_id, partner.user_id);
  }

  #[tokio::test]
  async fn test_only_the_recipient_marks_private_read() {
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Individual, now).await;
    let stranger = fixtures::partner(&db, UserType::Individual, now).await;
    let sv = Message::new(&db);

    let message = sv
      .send_private_from_admin(
        Uuid::new_v4(),
        partner.user_id,
        "Sujet".into(),
        "Contenu".into(),
      )
      .await
      .unwrap();

    let result = sv.mark_private_read(stranger.user_id, message.id).await;
    assert!(matches!(result, Err(Error::MessageNotFound)));
  }

  #[tokio::test]
  async fn test_private_deletion_requires_a_party() {
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Individual, now).await;
    let stranger = fixtures::partner(&db, UserType::Individual, now).await;
    let sv = Message::new(&db);

    let message = sv
      .send_private_from_admin(
        Uuid::new_v4(),
        partner.user_id,
        "Sujet".into(),
        "Contenu".into(),
      )
      .await
      .unwrap();

    let result = sv.delete_for_user(stranger.user_id, message.id).await;
    assert!(matches!(result, Err(Error::Forbidden)));

    sv.delete_for_user(partner.user_id, message.id).await.unwrap();
    assert_eq!(message::Entity::find().count(&db).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_admin_private_message_needs_existing_recipient() {
    let db = test_db::setup().await;
    let sv = Message::new(&db);

    let result = sv
      .send_private_from_admin(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "Sujet".into(),
        "Contenu".into(),
      )
      .await;
    assert!(matches!(result, Err(Error::PartnerNotFound)));
  }
}
