//! Period units and human-readable durations.

use chrono::Duration;

/// Unit a recurrence period is entered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
  Second,
  Minute,
  Hour,
  Day,
  Week,
}

impl PeriodUnit {
  /// Largest first
  pub const ALL: [PeriodUnit; 5] = [
    Self::Week,
    Self::Day,
    Self::Hour,
    Self::Minute,
    Self::Second,
  ];

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "s" => Some(Self::Second),
      "m" => Some(Self::Minute),
      "h" => Some(Self::Hour),
      "d" => Some(Self::Day),
      "w" => Some(Self::Week),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Second => "s",
      Self::Minute => "m",
      Self::Hour => "h",
      Self::Day => "d",
      Self::Week => "w",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::Second => "seconds",
      Self::Minute => "minutes",
      Self::Hour => "hours",
      Self::Day => "days",
      Self::Week => "weeks",
    }
  }

  pub fn seconds(&self) -> i64 {
    match self {
      Self::Second => 1,
      Self::Minute => 60,
      Self::Hour => 60 * 60,
      Self::Day => 24 * 60 * 60,
      Self::Week => 7 * 24 * 60 * 60,
    }
  }

  pub fn duration(&self) -> Duration {
    Duration::seconds(self.seconds())
  }
}

/// Largest unit with a non-zero whole count, e.g. 14 days -> (2, Week).
/// Durations under a second give (0, Second).
pub fn number_and_unit(d: Duration) -> (i64, PeriodUnit) {
  let secs = d.num_seconds();
  PeriodUnit::ALL
    .into_iter()
    .find(|unit| secs / unit.seconds() > 0)
    .map(|unit| (secs / unit.seconds(), unit))
    .unwrap_or((secs, PeriodUnit::Second))
}

/// Render a duration as e.g. `1 week 2 days 3h 4m 5s`, largest unit first,
/// skipping zero components. Negative durations get a leading `-`.
pub fn format_duration(d: Duration) -> String {
  let secs = d.num_seconds();
  if secs == 0 {
    return "0s".to_string();
  }

  let mut rest = secs.unsigned_abs();
  let mut parts = Vec::new();
  for unit in PeriodUnit::ALL {
    let size = unit.seconds() as u64;
    let count = rest / size;
    rest %= size;
    if count == 0 {
      continue;
    }
    parts.push(match unit {
      PeriodUnit::Week => format!("{} week{}", count, if count == 1 { "" } else { "s" }),
      PeriodUnit::Day => format!("{} day{}", count, if count == 1 { "" } else { "s" }),
      other => format!("{}{}", count, other.as_str()),
    });
  }

  let sign = if secs < 0 { "-" } else { "" };
  format!("{}{}", sign, parts.join(" "))
}

/// Round to the nearest multiple of `unit`, halves away from zero
pub fn round_to(d: Duration, unit: Duration) -> Duration {
  let ms = d.num_milliseconds();
  let step = unit.num_milliseconds();
  if step <= 0 {
    return d;
  }
  let rem = ms % step;
  let rounded = if rem.abs() * 2 >= step {
    ms - rem + rem.signum() * step
  } else {
    ms - rem
  };
  Duration::milliseconds(rounded)
}
