//! Pure helpers over untyped provider and store values

pub mod coerce;
pub mod probes;
