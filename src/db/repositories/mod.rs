pub mod compatibility;
pub mod metal;
pub mod product;
pub mod user;
