pub mod color;
pub mod deed;
pub mod period;

pub use color::Color;
pub use deed::{Deed, DeedView};
pub use period::{format_duration, number_and_unit, PeriodUnit};
