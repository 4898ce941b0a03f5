pub mod agents;
pub mod auth;
pub mod membership;
pub mod payments;
pub mod users;
