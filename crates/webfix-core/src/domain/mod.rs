//! Domain types for webfix.

pub mod critique;
pub mod error;
pub mod request;

pub use critique::{ConversationContext, CritiqueResult, Finding, ModelTier};
pub use error::{Result, ServiceError, ValidationError, WebfixError};
pub use request::{CorrectionRequest, Credential};
