//! Test Module
//!
//! Cross-module test suites for Haven core.
//!
//! ## Test Categories
//! - `brain_tests`: lexical analyzer ranges, determinism and keyword quirks
//! - `session_tests`: profile invariants and session transitions
//! - `database_tests`: record store behavior and corruption recovery
//! - `resource_tests`: resource gating and weighting
//! - `actor_tests`: chat actor, orchestrator and supervisor behavior
//! - `integration_tests`: full workflows across restarts

pub mod actor_tests;
