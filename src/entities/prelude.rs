pub use super::advertisements::Entity as Advertisements;
pub use super::users::Entity as Users;
