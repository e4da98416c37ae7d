//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate classifier and repository calls into use-case level APIs.
//! - Keep the HTTP and CLI layers decoupled from storage details.

pub mod note_service;
