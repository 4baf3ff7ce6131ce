pub mod reading;
pub mod series;
