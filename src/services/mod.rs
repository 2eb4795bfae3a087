pub mod admin_service;
pub mod admin_service_impl;
pub mod auth_service;
pub mod auth_service_impl;

pub use admin_service::{AdminError, AdminService, UserEdit};
pub use admin_service_impl::SeaOrmAdminService;
pub use auth_service::{AuthError, AuthService, AuthenticatedUser};
pub use auth_service_impl::SeaOrmAuthService;
