use std::fmt;

/// RGB colour rendered as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
  pub red: u8,
  pub green: u8,
  pub blue: u8,
}

pub const GREEN: Color = Color::new(0, 255, 0);
pub const YELLOW: Color = Color::new(255, 255, 0);
pub const RED: Color = Color::new(255, 0, 0);

impl Color {
  pub const fn new(red: u8, green: u8, blue: u8) -> Self {
    Self { red, green, blue }
  }

  /// Linear blend from `a` (0%) to `b` (100%); `percent` is clamped to 0..=100
  pub fn pick(a: Color, b: Color, percent: u8) -> Color {
    let p = u32::from(percent.min(100));
    let mix = |x: u8, y: u8| ((u32::from(x) * (100 - p) + u32::from(y) * p) / 100) as u8;
    Color {
      red: mix(a.red, b.red),
      green: mix(a.green, b.green),
      blue: mix(a.blue, b.blue),
    }
  }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
  }
}
