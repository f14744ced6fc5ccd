use crate::prelude::*;

pub fn format_date(date: DateTime) -> String {
  date.format("%d/%m/%Y").to_string()
}

pub fn cents_to_euros(cents: i64) -> f64 {
  cents as f64 / 100.0
}

pub fn euros_to_cents(euros: f64) -> i64 {
  (euros * 100.0).round() as i64
}

pub fn format_euros(cents: i64) -> String {
  format!("{:.2}€", cents_to_euros(cents))
}
