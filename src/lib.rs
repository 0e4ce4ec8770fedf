//! Document classification with chat-completion LLMs.
//!
//! Documents flow through [`extract`] (bounded text excerpt), [`summarize`]
//! and [`classify`], orchestrated by [`pipeline`]. [`discovery`] finds the
//! inputs and [`output`] writes the CSV report.

#![allow(clippy::should_implement_trait)]

pub mod classify;
pub mod config;
pub mod discovery;
pub mod extract;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod summarize;
