//! The message-exchange pipeline.
//!
//! A turn flows through [`orchestrator::TurnOrchestrator`], which uses the
//! history window to build context, the completion gateway to get a reply,
//! and the title summarizer after the first exchange.

pub mod gateway;
pub mod history;
pub mod orchestrator;
pub mod title;
