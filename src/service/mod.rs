//! Service integrations for external APIs and clients.
//!
//! This module contains the LLM service used by the classifier (OpenAI or
//! Azure OpenAI). It defines both a generic trait and a concrete implementation,
//! allowing for extensibility and easy testing.

pub mod llm;
