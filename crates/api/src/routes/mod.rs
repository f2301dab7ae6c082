pub mod audit;
pub mod authorize;
pub mod health;
pub mod metrics;
