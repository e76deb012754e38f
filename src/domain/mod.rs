pub mod error;
pub mod grid;
pub mod product;
pub mod revenue;
pub mod sales;
