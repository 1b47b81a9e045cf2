pub mod asset_grid_assignment;
pub mod meter_reading;

pub use asset_grid_assignment::AssetGridAssignment;
pub use meter_reading::MeterReading;
