//! Application layer for Mobile Studio.
//!
//! This crate provides the use case implementation that coordinates the
//! domain core, the generation source, and the persistence layer.

pub mod session_usecase;

pub use session_usecase::{SendOutcome, SessionUseCase};
