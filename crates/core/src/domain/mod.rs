pub mod cart;
pub mod money;
pub mod product;
pub mod weather;
