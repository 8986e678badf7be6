// apps/storefront/src/format.rs

//! Pure display and identifier helpers.

use chrono::{Datelike, Local, NaiveDate};
use rand_core::{OsRng, RngCore};

/// Formats an amount of rupiah the way the `id-ID` locale prints IDR:
/// `Rp` and a no-break space, `.` as the thousands separator, no fraction.
pub fn format_currency(amount: i64) -> String {
  let digits = amount.unsigned_abs().to_string();
  let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
  for (idx, ch) in digits.chars().enumerate() {
    if idx > 0 && (digits.len() - idx) % 3 == 0 {
      grouped.push('.');
    }
    grouped.push(ch);
  }
  let sign = if amount < 0 { "-" } else { "" };
  format!("{}Rp\u{a0}{}", sign, grouped)
}

/// Up to two uppercase initials from a display name; `U` when none.
pub fn initials(name: &str) -> String {
  let letters: String = name
    .split(' ')
    .filter_map(|part| part.chars().next())
    .flat_map(char::to_uppercase)
    .take(2)
    .collect();
  if letters.is_empty() {
    "U".to_string()
  } else {
    letters
  }
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn validate_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  if local.is_empty() || domain.contains('@') {
    return false;
  }
  domain
    .char_indices()
    .any(|(idx, ch)| ch == '.' && idx > 0 && idx + 1 < domain.len())
}

/// `SW` + local date (`YYYYMMDD`) + four random digits.
///
/// Not checked for uniqueness against existing orders.
pub fn generate_order_number() -> String {
  let suffix = (OsRng.next_u32() % 10_000) as u16;
  generate_order_number_on(Local::now().date_naive(), suffix)
}

pub fn generate_order_number_on(date: NaiveDate, suffix: u16) -> String {
  format!(
    "SW{:04}{:02}{:02}{:04}",
    date.year(),
    date.month(),
    date.day(),
    suffix % 10_000
  )
}
