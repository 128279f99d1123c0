pub mod auth;
pub mod reservoir;
