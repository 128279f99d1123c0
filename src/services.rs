pub mod auth;
pub mod reservoir_service;
pub mod seed;
pub mod token;
