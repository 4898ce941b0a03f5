//! Repositories: stateless structs that own the SQL for one table family.

pub mod agent_repo;
pub mod application_repo;
pub mod payment_repo;
pub mod user_repo;

pub use agent_repo::AgentRepo;
pub use application_repo::{ApplicationRepo, TransitionOutcome};
pub use payment_repo::PaymentRepo;
pub use user_repo::UserRepo;
