pub mod advertisement_service;
pub mod advertisement_service_impl;
pub use advertisement_service::{AdvertisementError, AdvertisementService};
pub use advertisement_service_impl::SeaOrmAdvertisementService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserService, UserUpdate};
pub use user_service_impl::SeaOrmUserService;
