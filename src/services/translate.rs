// src/services/translate.rs

//! Translation seam.
//!
//! Translation quality and transport are an external concern; the
//! harvester only attaches whatever a [`Translator`] returns to kept
//! records with a non-target language tag.

use async_trait::async_trait;

use crate::error::Result;
use crate::services::language::LanguageTag;

/// External translation collaborator.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` (tagged `source`) into the collaborator's
    /// configured target language.
    async fn translate(&self, text: &str, source: &LanguageTag) -> Result<String>;
}
