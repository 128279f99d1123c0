pub mod auth;
pub mod reservoirs;
