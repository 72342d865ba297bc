pub mod correlation;
pub mod params;
pub mod swap_rate;
