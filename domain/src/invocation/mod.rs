//! Invocation domain module
//!
//! An [`Invocation`] is the audit record of one attempt to execute a tool.
//! It only proves that an attempt was logged, never that a remote call ran.
//!
//! # State machine
//!
//! ```text
//!            ┌──▶ completed  (output hash, receipt signature, cost)
//! pending ───┼──▶ failed     (error message)
//!            └──▶ timeout    (error message)
//! ```
//!
//! Every terminal state is final. The store applies transitions with a
//! `status = 'pending'` guard; [`Invocation::apply`] is the in-memory form
//! of the same rule.

pub mod entities;

pub use entities::{Invocation, InvocationId, InvocationOutcome, InvocationStatus};
