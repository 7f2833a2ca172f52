//! Core components, types, and utilities for the ticket classifier.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - The system directive sent to the classification model.
//! - Common types, result aliases, and pipeline error kinds.

pub mod config;
pub mod error;
pub mod prompts;
pub mod types;
