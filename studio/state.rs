use std::sync::Arc;

use ferrite_sketch::{ModeConfig, ModeContext, ModeKey, SketchConfig};

/// Everything the request threads share: the settings and one context per
/// mode. Contexts guard themselves, so no outer lock is needed.
pub struct StudioState {
    pub config: SketchConfig,
    digit: ModeContext,
    letter: ModeContext,
}

impl StudioState {
    pub fn new(config: SketchConfig) -> Self {
        StudioState {
            config,
            digit: ModeContext::new(ModeConfig::digit()),
            letter: ModeContext::new(ModeConfig::letter()),
        }
    }

    pub fn context(&self, key: ModeKey) -> &ModeContext {
        match key {
            ModeKey::Digit => &self.digit,
            ModeKey::Letter => &self.letter,
        }
    }
}

pub type SharedState = Arc<StudioState>;
