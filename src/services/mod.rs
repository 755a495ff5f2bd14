pub mod health;
pub mod quiz;
pub mod scheduler;
