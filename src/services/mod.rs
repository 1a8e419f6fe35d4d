pub mod auth_service;
pub use auth_service::{AuthError, AuthService, Claims};

pub mod email;
pub use email::{EmailError, EmailService, LettreMailer, Mailer, OutgoingEmail};

pub mod user_service;
pub use user_service::{LoginResult, UserError, UserService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;

pub mod product_service;
pub use product_service::{ProductError, ProductService};

pub mod product_service_impl;
pub use product_service_impl::SeaOrmProductService;

pub mod metal_service;
pub use metal_service::{MetalError, MetalService};

pub mod metal_service_impl;
pub use metal_service_impl::SeaOrmMetalService;

pub mod compatibility_service;
pub use compatibility_service::{CompatibilityError, CompatibilityService};

pub mod compatibility_service_impl;
pub use compatibility_service_impl::SeaOrmCompatibilityService;

#[cfg(test)]
pub(crate) mod test_support;
