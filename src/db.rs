pub mod store;
pub use store::{ReservoirStore, UserStore};
pub mod reservoir_repo;
pub use reservoir_repo::ReservoirRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod memory;
pub use memory::{InMemoryReservoirStore, InMemoryUserStore};
