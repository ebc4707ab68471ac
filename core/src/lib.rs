//! plancraft core: task model, dependency graph, failure taxonomy, routing,
//! context cache and the todo-list orchestrator.
//!
//! Concrete decomposers, executors, stores, prompts and renderers live in
//! `plancraft-plugins`; this crate only defines their traits.

pub mod api;
pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod failure;
pub mod graph;
pub mod interactive;
pub mod orchestrator;
pub mod render;
pub mod router;
pub mod services;
pub mod task;
