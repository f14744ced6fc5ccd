//! Eligibility-window arithmetic. A partner's reward year runs from one
//! profile-creation anniversary to the next, and both the annual cap and
//! the voucher tier are counted inside that window.

use chrono::{Datelike, NaiveDate};

use crate::{
  entity::{LeadStatus, lead},
  prelude::*,
};

/// Installed referrals an individual partner may convert per reward year.
pub const ANNUAL_CAP: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
  pub start: DateTime,
  pub end: DateTime,
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
  let (next_year, next_month) =
    if month == 12 { (year + 1, 1) } else { (year, month + 1) };
  NaiveDate::from_ymd_opt(next_year, next_month, 1)
    .expect("first of month is always valid")
    .pred_opt()
    .expect("first of month has a predecessor")
}

/// The anchor shifted into `year`, clamped to the last valid day of the
/// month: a Feb 29 anchor lands on Feb 28 in non-leap years. Time of day
/// is preserved.
fn anniversary_in_year(anchor: DateTime, year: i32) -> DateTime {
  NaiveDate::from_ymd_opt(year, anchor.month(), anchor.day())
    .unwrap_or_else(|| last_day_of_month(year, anchor.month()))
    .and_time(anchor.time())
}

/// Current window `[start, end)`: `start` is the most recent anniversary
/// of `anchor` that is `<= now`, `end` one year later.
pub fn current_window(anchor: DateTime, now: DateTime) -> Window {
  let mut start = anniversary_in_year(anchor, now.year());
  if start > now {
    start = anniversary_in_year(anchor, now.year() - 1);
  }
  let end = anniversary_in_year(anchor, start.year() + 1);

  Window { start, end }
}

/// Installed referrals credited to the window: leads submitted inside
/// `[start, end)` that have reached `installé`. Generic over the
/// connection so cap and ordinal checks run inside the transaction that
/// updates the lead.
pub async fn installed_in_window<C: ConnectionTrait>(
  conn: &C,
  partner_id: Uuid,
  window: &Window,
) -> Result<u64> {
  Ok(
    lead::Entity::find()
      .filter(lead::Column::UserId.eq(partner_id))
      .filter(lead::Column::Status.eq(LeadStatus::Installed))
      .filter(lead::Column::CreatedAt.gte(window.start))
      .filter(lead::Column::CreatedAt.lt(window.end))
      .count(conn)
      .await?,
  )
}
