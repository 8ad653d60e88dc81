//! Narrative generation through the Gemini API.
//!
//! The pipeline only sees the `NarrativeProvider` trait; `GeminiProvider`
//! implements it over Gemini's streaming endpoint.

pub mod config;
pub mod conversation;
pub mod providers;
pub mod tagger;
pub mod types;

pub use config::LLMConfig;
pub use conversation::{Conversation, ConversationStore};
pub use providers::{GeminiProvider, NarrativeProvider, ProviderError};
pub use tagger::{DoctorTypeTagger, NO_DOCTOR_TYPE};
pub use types::*;
