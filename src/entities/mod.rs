pub mod prelude;

pub mod advertisements;
pub mod users;
