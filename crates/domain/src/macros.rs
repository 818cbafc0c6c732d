//! Macro for implementing Display and FromStr for label enums
//!
//! Day types, timetable modes and similar closed sets travel as lowercase
//! labels in config files and logs. The macro keeps both directions of the
//! conversion in one table.
//!
//! # Example
//!
//! ```rust
//! use weekplan_domain::impl_label_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Mode {
//!     Actual,
//!     Permanent,
//! }
//!
//! impl_label_conversions!(Mode {
//!     Actual => "actual",
//!     Permanent => "permanent",
//! });
//!
//! assert_eq!("PERMANENT".parse::<Mode>(), Ok(Mode::Permanent));
//! ```

/// Implements Display and FromStr for a fieldless enum
///
/// Parsing is case-insensitive; display always yields the lowercase label.
/// Labels passed to the macro must themselves be lowercase.
#[macro_export]
macro_rules! impl_label_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
