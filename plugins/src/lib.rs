pub mod backend;
pub mod executor;
pub mod factory;
pub mod planner;
pub mod prompt;
pub mod services;
pub mod store;
