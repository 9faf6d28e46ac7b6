//! Text translation.
//!
//! - `traits`: the `Translator` trait
//! - `public`: public translation endpoint
//! - `completion`: translation through the generative capability
//! - `routed`: target-based routing with identity fallback

pub mod completion;
pub mod public;
pub mod routed;
pub mod traits;

pub use completion::CompletionTranslator;
pub use public::PublicTranslator;
pub use routed::RoutedTranslator;
pub use traits::{language_name, Translator};

use std::sync::Arc;

use tracing::warn;

use crate::capability::Completion;
use crate::config::TranslationConfig;

/// Build the routed translator described by config.
pub fn from_config(config: &TranslationConfig, capability: Arc<dyn Completion>) -> RoutedTranslator {
    let public: Option<Box<dyn Translator>> = if config.enabled {
        match PublicTranslator::new(config) {
            Ok(translator) => Some(Box::new(translator)),
            Err(e) => {
                warn!("failed to build public translator: {} (skipping)", e);
                None
            }
        }
    } else {
        None
    };

    RoutedTranslator::new(public, Box::new(CompletionTranslator::new(capability)))
}
