//! Property-based tests for prompt and plan guarantees

mod determinism;
