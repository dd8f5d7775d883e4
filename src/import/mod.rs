//! File importers for structured workouts and lab reports

pub mod metabolic;
pub mod zwo;

pub use metabolic::MetabolicImporter;
pub use zwo::{ZwoImporter, ZwoWorkout};
