pub mod availability;

pub use availability::{AvailabilityReport, DayAvailability, UnitAvailability, project, project_range};
