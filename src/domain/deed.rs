use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::color::{Color, GREEN, RED, YELLOW};
use super::period::{format_duration, round_to};

/// Steepness of the urgency curve: urgency moves from ~0 to 0.5 over one period
const URGENCY_STEEPNESS: f64 = 6.0;

/// A recurring task and when it was last done
#[derive(Debug, Clone, PartialEq)]
pub struct Deed {
  pub id: Uuid,
  pub name: String,
  pub period: Duration,
  pub last: DateTime<Utc>,
}

impl Deed {
  /// New deed, counted as done now
  pub fn new(name: String, period: Duration) -> Self {
    Self {
      id: Uuid::new_v4(),
      name,
      period,
      last: Utc::now(),
    }
  }

  /// Time past the due date (negative while still due in the future),
  /// rounded to a resolution that fits the period length.
  pub fn overdue_at(&self, now: DateTime<Utc>) -> Duration {
    let delta = (now - self.last) - self.period;
    let resolution = if self.period >= Duration::weeks(1) {
      Duration::days(1)
    } else if self.period >= Duration::days(1) {
      Duration::hours(1)
    } else if self.period >= Duration::hours(1) {
      Duration::minutes(1)
    } else {
      Duration::seconds(1)
    };
    round_to(delta, resolution)
  }

  /// Logistic urgency in 0..=1; exactly 0.5 when the deed falls due
  pub fn urgency_at(&self, now: DateTime<Utc>) -> f64 {
    let period_ms = self.period.num_milliseconds();
    if period_ms <= 0 {
      return 1.0;
    }
    let delta_ms = ((now - self.last) - self.period).num_milliseconds();
    let relative = URGENCY_STEEPNESS * delta_ms as f64 / period_ms as f64;
    1.0 / (1.0 + (-relative).exp())
  }

  /// Green while fresh, yellow when due, red when long overdue
  pub fn color_at(&self, now: DateTime<Utc>) -> Color {
    let f = self.urgency_at(now);
    if f < 0.5 {
      Color::pick(GREEN, YELLOW, (f * 200.0) as u8)
    } else {
      Color::pick(YELLOW, RED, ((f - 0.5) * 200.0) as u8)
    }
  }

  pub fn view_at(&self, now: DateTime<Utc>) -> DeedView {
    let overdue = self.overdue_at(now);
    DeedView {
      id: self.id.to_string(),
      name: self.name.clone(),
      color: self.color_at(now).to_string(),
      period: format_duration(self.period),
      is_overdue: overdue > Duration::zero(),
      overdue: format_duration(overdue.abs()),
    }
  }
}

/// Render model for a deed
#[derive(Debug, Clone)]
pub struct DeedView {
  pub id: String,
  pub name: String,
  /// `#rrggbb`
  pub color: String,
  pub period: String,
  pub is_overdue: bool,
  /// Overdue time, or time left when not overdue
  pub overdue: String,
}
