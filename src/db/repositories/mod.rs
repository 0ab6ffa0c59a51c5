pub mod advertisement;
pub mod user;
