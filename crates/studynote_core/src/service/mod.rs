//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate storage calls into use-case level APIs.
//! - Keep the command interpreter decoupled from record and file details.

pub mod note_service;
