pub mod adapter;
pub mod data_type;
pub mod params;
pub mod probe;
pub mod row;
