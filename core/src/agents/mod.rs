//! One module per role (C9), plus the shared JSON-extraction helper every
//! role's response parsing goes through. Each role agent is a thin wrapper
//! around a [`forgelet_llm::LLMProvider`]: build a system prompt, drive one
//! completion (or, for Executor/Fixer, a full tool-calling turn loop via
//! [`crate::engine::ToolExecutionEngine`]), then parse the reply against a
//! JSON schema contract.

pub mod base;
pub mod evaluator;
pub mod executor;
pub mod fixer;
pub mod manager;
pub mod reviewer;

pub use evaluator::EvaluatorAgent;
pub use executor::ExecutorAgent;
pub use fixer::FixerAgent;
pub use manager::ManagerAgent;
pub use reviewer::ReviewerAgent;
