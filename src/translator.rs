//! Smart translation on top of a chat-completion model.
//!
//! The model is reached through [`LanguageModel`], so the resolution logic
//! here never touches HTTP. Each external call is awaited before the next
//! one is issued, and any failure ends the operation.

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{TranslateError, TranslateResult};
use crate::language::{LanguageChoice, LanguagePair};

/// The three requests the translator makes of the hosted model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// English name of the language `text` is written in.
    async fn detect(&self, text: &str) -> TranslateResult<String>;
    /// `text` rendered in `target_language`, translation only.
    async fn translate(&self, text: &str, target_language: &str) -> TranslateResult<String>;
    /// Bullet notes expanded into Vietnamese and English prose.
    async fn expand(&self, bullet_points: &str) -> TranslateResult<ExpandedContent>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedContent {
    pub vietnamese_content: String,
    pub english_content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentExpansion {
    pub vietnamese_content: String,
    pub english_content: String,
    pub original_text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslateOptions {
    pub source: LanguageChoice,
    pub target: LanguageChoice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    pub detected_language: String,
    pub target_language: String,
    pub translated_text: String,
    pub original_text: String,
}

pub struct Translator<M> {
    model: M,
    languages: LanguagePair,
}

impl<M: LanguageModel> Translator<M> {
    pub fn new(model: M, languages: LanguagePair) -> Self {
        Self { model, languages }
    }

    /// Detects (or takes) the source language, resolves the target against
    /// the configured pair unless pinned, then translates.
    pub async fn smart_translate(
        &self,
        text: &str,
        options: &TranslateOptions,
    ) -> TranslateResult<TranslationResult> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TranslateError::EmptyInput);
        }

        let detected_language = match &options.source {
            LanguageChoice::Explicit(label) => label.clone(),
            LanguageChoice::Auto => self.model.detect(text).await?,
        };

        let target_language = match &options.target {
            LanguageChoice::Explicit(label) => label.clone(),
            LanguageChoice::Auto => self.languages.target_for(&detected_language),
        };
        debug!("Translating {} -> {}", detected_language, target_language);

        let translated_text = self.model.translate(text, &target_language).await?;

        Ok(TranslationResult {
            detected_language,
            target_language,
            translated_text,
            original_text: text.to_string(),
        })
    }

    pub async fn expand_content(&self, bullet_points: &str) -> TranslateResult<ContentExpansion> {
        let bullet_points = bullet_points.trim();
        if bullet_points.is_empty() {
            return Err(TranslateError::EmptyInput);
        }

        let expanded = self.model.expand(bullet_points).await?;
        Ok(ContentExpansion {
            vietnamese_content: expanded.vietnamese_content,
            english_content: expanded.english_content,
            original_text: bullet_points.to_string(),
        })
    }
}
