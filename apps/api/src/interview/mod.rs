//! Interview orchestration: a session advances one stage per invocation through
//! interviewing → evaluating → summarizing → done.
//!
//! Data flow for one turn:
//!   store.get → controller.advance → pipeline.run_stage
//!     → composer → llm_client::invoke → extract → normalize
//!   → store.compare_and_swap

pub mod composer;
pub mod controller;
pub mod extract;
pub mod handlers;
pub mod normalize;
pub mod prompts;
pub mod session;
pub mod stages;
pub mod store;
