//! Per-mode configuration and state.
//!
//! Digit and letter modes run the same pipeline with different presets. Each
//! `ModeContext` owns its loaded model, its diagram plan and its
//! concurrency guards; the two contexts never share mutable state.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::engine::InferenceEngine;
use crate::error::{Result, SketchError};
use crate::viz::topology::{plan_layers, LayerSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKey {
    Digit,
    Letter,
}

impl ModeKey {
    pub const ALL: [ModeKey; 2] = [ModeKey::Digit, ModeKey::Letter];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKey::Digit => "digit",
            ModeKey::Letter => "letter",
        }
    }
}

impl fmt::Display for ModeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "digit" | "digits" => Ok(ModeKey::Digit),
            "letter" | "letters" | "char" | "character" => Ok(ModeKey::Letter),
            other => Err(format!("unknown mode '{}', expected 'digit' or 'letter'", other)),
        }
    }
}

/// Fixed per-mode preset.
#[derive(Debug, Clone)]
pub struct ModeConfig {
    pub key: ModeKey,
    pub default_model: &'static str,
    pub class_count: usize,
    /// The letter corpus stores glyphs with rows and columns swapped.
    pub transpose: bool,
    label: fn(usize) -> String,
}

fn digit_label(i: usize) -> String {
    i.to_string()
}

fn letter_label(i: usize) -> String {
    match u8::try_from(i) {
        Ok(n) if n < 26 => char::from(b'A' + n).to_string(),
        _ => format!("#{}", i),
    }
}

impl ModeConfig {
    pub fn digit() -> Self {
        ModeConfig {
            key: ModeKey::Digit,
            default_model: "models/digits.json",
            class_count: 10,
            transpose: false,
            label: digit_label,
        }
    }

    pub fn letter() -> Self {
        ModeConfig {
            key: ModeKey::Letter,
            default_model: "models/letters.json",
            class_count: 26,
            transpose: true,
            label: letter_label,
        }
    }

    pub fn for_key(key: ModeKey) -> Self {
        match key {
            ModeKey::Digit => ModeConfig::digit(),
            ModeKey::Letter => ModeConfig::letter(),
        }
    }

    pub fn label(&self, index: usize) -> String {
        (self.label)(index)
    }

    pub fn labels(&self) -> Vec<String> {
        (0..self.class_count).map(|i| self.label(i)).collect()
    }
}

/// An installed engine plus everything derived from its metadata at load time.
pub struct LoadedModel {
    pub engine: Arc<dyn InferenceEngine>,
    pub input_name: String,
    pub declared_input: Option<Vec<i64>>,
    pub output_name: Option<String>,
    pub layers: Vec<LayerSpec>,
}

impl LoadedModel {
    pub fn new(engine: Arc<dyn InferenceEngine>, config: &ModeConfig) -> Result<LoadedModel> {
        let meta = engine.metadata();
        let input = meta
            .inputs
            .first()
            .ok_or_else(|| SketchError::ModelLoad("engine exposes no inputs".into()))?;
        let output = meta.outputs.first();
        let layers = plan_layers(
            input.declared(),
            output.and_then(|o| o.declared()),
            config.class_count,
        );
        Ok(LoadedModel {
            input_name: input.name.clone(),
            declared_input: input.declared().map(|d| d.to_vec()),
            output_name: output.map(|o| o.name.clone()),
            layers,
            engine,
        })
    }
}

/// Identifies one load request; only the newest may install its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(u64);

/// Held while a prediction runs; dropping it clears the in-flight flag.
pub struct PredictionGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for PredictionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct ModeContext {
    config: ModeConfig,
    model: RwLock<Option<Arc<LoadedModel>>>,
    latest_load: AtomicU64,
    in_flight: AtomicBool,
}

impl ModeContext {
    pub fn new(config: ModeConfig) -> Self {
        ModeContext {
            config,
            model: RwLock::new(None),
            latest_load: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ModeConfig {
        &self.config
    }

    pub fn key(&self) -> ModeKey {
        self.config.key
    }

    /// Starts a load; any earlier load still running becomes stale.
    pub fn begin_load(&self) -> LoadToken {
        LoadToken(self.latest_load.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Installs `engine` if `token` is still the newest load.
    ///
    /// Returns `Ok(false)` for a stale token; the engine is dropped.
    pub fn install(&self, token: LoadToken, engine: Arc<dyn InferenceEngine>) -> Result<bool> {
        let loaded = LoadedModel::new(engine, &self.config)?;
        let mut slot = self.model.write().unwrap_or_else(PoisonError::into_inner);
        if token.0 != self.latest_load.load(Ordering::Acquire) {
            log::warn!("{}: discarding result of superseded load #{}", self.key(), token.0);
            return Ok(false);
        }
        log::info!(
            "{}: model installed (input '{}' {:?}, diagram {:?})",
            self.key(),
            loaded.input_name,
            loaded.declared_input,
            loaded.layers.iter().map(|l| l.nodes).collect::<Vec<_>>()
        );
        *slot = Some(Arc::new(loaded));
        Ok(true)
    }

    pub fn model(&self) -> Option<Arc<LoadedModel>> {
        self.model.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_ready(&self) -> bool {
        self.model.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Diagram plan of the installed model, or the metadata-free default
    /// while no model is loaded.
    pub fn layers(&self) -> Vec<LayerSpec> {
        match self.model() {
            Some(m) => m.layers.clone(),
            None => plan_layers(None, None, self.config.class_count),
        }
    }

    /// Claims the single prediction slot, or `None` if one is running.
    pub fn try_begin_prediction(&self) -> Option<PredictionGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PredictionGuard { flag: &self.in_flight })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineMetadata, NamedTensors, TensorInfo};
    use crate::error::EngineError;

    struct Stub(EngineMetadata);

    impl InferenceEngine for Stub {
        fn metadata(&self) -> &EngineMetadata {
            &self.0
        }
        fn run(&self, _: &NamedTensors) -> std::result::Result<NamedTensors, EngineError> {
            Err(EngineError::new("stub"))
        }
    }

    fn stub(input_dims: Vec<i64>) -> Arc<dyn InferenceEngine> {
        Arc::new(Stub(EngineMetadata {
            inputs: vec![TensorInfo::new("x", input_dims)],
            outputs: vec![TensorInfo::new("y", vec![1, 26])],
        }))
    }

    #[test]
    fn labels() {
        assert_eq!(ModeConfig::digit().labels()[7], "7");
        let letters = ModeConfig::letter().labels();
        assert_eq!(letters.len(), 26);
        assert_eq!((letters[0].as_str(), letters[25].as_str()), ("A", "Z"));
        assert_eq!(ModeConfig::letter().label(30), "#30");
    }

    #[test]
    fn mode_keys_parse() {
        assert_eq!("Digit".parse::<ModeKey>(), Ok(ModeKey::Digit));
        assert_eq!("char".parse::<ModeKey>(), Ok(ModeKey::Letter));
        assert!("emoji".parse::<ModeKey>().is_err());
    }

    #[test]
    fn newest_load_wins_even_when_it_finishes_first() {
        let ctx = ModeContext::new(ModeConfig::letter());
        let slow = ctx.begin_load();
        let fast = ctx.begin_load();
        assert!(ctx.install(fast, stub(vec![1, 784])).unwrap());
        assert!(!ctx.install(slow, stub(vec![1, 1, 28, 28])).unwrap());
        assert_eq!(ctx.model().unwrap().declared_input, Some(vec![1, 784]));
    }

    #[test]
    fn install_derives_layer_plan() {
        let ctx = ModeContext::new(ModeConfig::letter());
        assert!(!ctx.is_ready());
        assert_eq!(ctx.layers().len(), 4);
        let t = ctx.begin_load();
        ctx.install(t, stub(vec![-1, 1, 28, 28])).unwrap();
        assert!(ctx.is_ready());
        let m = ctx.model().unwrap();
        assert_eq!(m.input_name, "x");
        assert_eq!(m.output_name.as_deref(), Some("y"));
        assert_eq!(m.layers.last().unwrap().nodes, 26);
    }

    #[test]
    fn engine_without_inputs_is_rejected() {
        let ctx = ModeContext::new(ModeConfig::digit());
        let t = ctx.begin_load();
        let err = ctx.install(t, Arc::new(Stub(EngineMetadata::default()))).unwrap_err();
        assert!(matches!(err, SketchError::ModelLoad(_)));
        assert!(!ctx.is_ready());
    }

    #[test]
    fn only_one_prediction_in_flight() {
        let ctx = ModeContext::new(ModeConfig::digit());
        let other = ModeContext::new(ModeConfig::letter());
        let guard = ctx.try_begin_prediction().expect("slot free");
        assert!(ctx.try_begin_prediction().is_none());
        // the other mode is unaffected
        assert!(other.try_begin_prediction().is_some());
        drop(guard);
        assert!(ctx.try_begin_prediction().is_some());
    }
}
