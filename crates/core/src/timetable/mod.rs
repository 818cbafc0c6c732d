//! School timetable normalization

pub mod normalizer;
pub mod ports;

pub use normalizer::TimetableNormalizer;
pub use ports::TimetableSource;
