pub mod prelude;

pub mod compatibilities;
pub mod compatibility_pairs;
pub mod compatibility_version;
pub mod metals;
pub mod products;
pub mod users;
