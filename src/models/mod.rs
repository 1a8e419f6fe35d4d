pub mod compatibility;
pub mod metal;
pub mod pagination;
pub mod product;
pub mod user;

pub use pagination::{Page, PageRequest, SortField, SortOrder};
