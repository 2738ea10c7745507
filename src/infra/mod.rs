pub mod cache;
pub mod email;
pub mod factory;
pub mod payments;
pub mod repositories;
