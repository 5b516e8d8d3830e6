pub mod campaign;
pub mod row;
pub mod segment;
