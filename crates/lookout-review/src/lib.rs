//! Review pipeline for the lookout bot.
//!
//! Provides the heuristic rule engine and built-in rules, the LLM client and
//! review engine, the finding merger, the review publisher, GitHub App
//! authentication, and the orchestrator that ties them together.

pub mod engine;
pub mod github;
pub mod heuristics;
pub mod jwt;
pub mod llm;
pub mod merge;
pub mod pipeline;
pub mod prompt;
pub mod publish;
pub mod rules;

#[cfg(test)]
mod test_server;
