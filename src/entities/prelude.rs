pub use super::compatibilities::Entity as Compatibilities;
pub use super::compatibility_pairs::Entity as CompatibilityPairs;
pub use super::compatibility_version::Entity as CompatibilityVersion;
pub use super::metals::Entity as Metals;
pub use super::products::Entity as Products;
pub use super::users::Entity as Users;
