//! Deterministic, pure logic shared by the generation pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return structured results suitable for tests.

pub mod corrections;
pub mod retry;
pub mod session;
pub mod types;
pub mod validator;
