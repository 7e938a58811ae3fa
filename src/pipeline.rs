//! Per-tick prediction and per-request model loading.
//!
//! `predict` runs the whole chain for one canvas against one loaded model.
//! `tick` and `load` are the top-level routines the front ends call: they
//! honour readiness, coalescing and load tokens, and turn every failure into
//! a status line instead of propagating it.

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use serde::Serialize;

use crate::engine::{DenseEngine, InferenceEngine, Tensor};
use crate::error::Result;
use crate::grid::{self, NormalizedGrid};
use crate::inference::run_candidates;
use crate::mode::{LoadedModel, ModeConfig, ModeContext, ModeKey};
use crate::probability::{argmax, normalize_probabilities};
use crate::shape::candidate_shapes;
use crate::viz::{self, LayerActivity, LayerSpec};

/// Everything a front end needs to draw one frame.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub mode: ModeKey,
    /// `None` while idle.
    pub label: Option<String>,
    pub confidence: f32,
    pub probabilities: Vec<f32>,
    pub labels: Vec<String>,
    pub layers: Vec<LayerSpec>,
    pub activity: LayerActivity,
    pub accepted_shape: Option<Vec<usize>>,
    pub ink_sum: f32,
    #[serde(skip)]
    pub grid: NormalizedGrid,
}

impl Report {
    pub fn status_text(&self) -> String {
        format!("Prediction: {}", self.label.as_deref().unwrap_or("-"))
    }

    fn idle(config: &ModeConfig, layers: Vec<LayerSpec>, grid: NormalizedGrid) -> Report {
        Report {
            mode: config.key,
            label: None,
            confidence: 0.0,
            probabilities: vec![0.0; config.class_count],
            labels: config.labels(),
            activity: viz::idle(&layers),
            layers,
            accepted_shape: None,
            ink_sum: grid.ink_sum(),
            grid,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Prediction {
    /// Too little ink; inference was not attempted.
    Idle(Report),
    Ready(Report),
}

impl Prediction {
    pub fn report(&self) -> &Report {
        match self {
            Prediction::Idle(r) | Prediction::Ready(r) => r,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Prediction::Idle(_))
    }
}

/// Runs normalization, shape negotiation, inference, probability
/// normalization and diagram synthesis for one canvas.
pub fn predict(model: &LoadedModel, config: &ModeConfig, canvas: &RgbaImage) -> Result<Prediction> {
    predict_grid(model, config, grid::normalize(canvas))
}

/// `predict` for an already normalized grid.
pub fn predict_grid(model: &LoadedModel, config: &ModeConfig, grid: NormalizedGrid) -> Result<Prediction> {
    if grid.is_blank() {
        return Ok(Prediction::Idle(Report::idle(config, model.layers.clone(), grid)));
    }

    let fed = if config.transpose { grid.transposed() } else { grid.clone() };
    let buffer = Tensor::flat(fed.into_cells());
    let candidates = candidate_shapes(buffer.len(), model.declared_input.as_deref());

    let accepted = run_candidates(
        model.engine.as_ref(),
        &model.input_name,
        model.output_name.as_deref(),
        &buffer,
        &candidates,
    )?;
    if !accepted.failures.is_empty() {
        log::debug!(
            "{}: shape {:?} accepted after {} rejection(s)",
            config.key,
            accepted.shape,
            accepted.failures.len()
        );
    }

    let probabilities = normalize_probabilities(accepted.output.data(), config.class_count)?;
    let top = argmax(&probabilities).unwrap_or(0);
    let activity = viz::synthesize(&model.layers, grid.cells(), buffer.data(), &probabilities);

    Ok(Prediction::Ready(Report {
        mode: config.key,
        label: Some(config.label(top)),
        confidence: probabilities[top],
        labels: config.labels(),
        probabilities,
        layers: model.layers.clone(),
        activity,
        accepted_shape: Some(accepted.shape),
        ink_sum: grid.ink_sum(),
        grid,
    }))
}

/// Result of one prediction tick.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// No model installed yet; nothing was done.
    Cold,
    /// Another prediction for this mode is still running; this one was
    /// coalesced into it.
    Busy,
    Done(Prediction),
    /// Any pipeline error, already turned into a user-facing message.
    Failed(String),
}

impl TickOutcome {
    pub fn status_text(&self) -> String {
        match self {
            TickOutcome::Cold => "Model not loaded".to_string(),
            TickOutcome::Busy => "Predicting…".to_string(),
            TickOutcome::Done(p) => p.report().status_text(),
            TickOutcome::Failed(msg) => format!("Error: {}", msg),
        }
    }
}

/// One prediction tick for `ctx`.
pub fn tick(ctx: &ModeContext, canvas: &RgbaImage) -> TickOutcome {
    tick_with(ctx, || Ok(grid::normalize(canvas)))
}

/// One tick for raw canvas bytes (PNG and friends).
pub fn tick_bytes(ctx: &ModeContext, bytes: &[u8]) -> TickOutcome {
    tick_with(ctx, || grid::decode_canvas(bytes).map(|c| grid::normalize(&c)))
}

fn tick_with<F>(ctx: &ModeContext, grid: F) -> TickOutcome
where
    F: FnOnce() -> Result<NormalizedGrid>,
{
    let Some(model) = ctx.model() else {
        return TickOutcome::Cold;
    };
    let Some(_guard) = ctx.try_begin_prediction() else {
        return TickOutcome::Busy;
    };
    match grid().and_then(|g| predict_grid(&model, ctx.config(), g)) {
        Ok(p) => TickOutcome::Done(p),
        Err(e) => {
            log::warn!("{}: prediction failed: {}", ctx.key(), e);
            TickOutcome::Failed(e.to_string())
        }
    }
}

/// Result of one load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Installed,
    /// A newer load started while this one ran; its result was dropped.
    Superseded,
    Failed(String),
}

impl LoadOutcome {
    pub fn status_text(&self, key: ModeKey) -> String {
        match self {
            LoadOutcome::Installed => format!("{} model ready", key),
            LoadOutcome::Superseded => format!("{} model load superseded", key),
            LoadOutcome::Failed(msg) => format!("Error: {}", msg),
        }
    }
}

/// Runs `loader` under a fresh load token and installs its engine if no
/// newer load has started meanwhile.
pub fn load<F>(ctx: &ModeContext, loader: F) -> LoadOutcome
where
    F: FnOnce() -> Result<Arc<dyn InferenceEngine>>,
{
    let token = ctx.begin_load();
    match loader().and_then(|engine| ctx.install(token, engine)) {
        Ok(true) => LoadOutcome::Installed,
        Ok(false) => LoadOutcome::Superseded,
        Err(e) => {
            log::warn!("{}: {}", ctx.key(), e);
            LoadOutcome::Failed(e.to_string())
        }
    }
}

/// Loads a dense JSON model from `path` into `ctx`.
pub fn load_path(ctx: &ModeContext, path: &Path) -> LoadOutcome {
    load(ctx, || DenseEngine::load(path).map(|e| Arc::new(e) as Arc<dyn InferenceEngine>))
}

/// Loads a dense JSON model from bytes (e.g. an upload) into `ctx`.
pub fn load_bytes(ctx: &ModeContext, bytes: &[u8]) -> LoadOutcome {
    load(ctx, || DenseEngine::from_slice(bytes).map(|e| Arc::new(e) as Arc<dyn InferenceEngine>))
}
