//! Viewer session - Single Source of Truth (SSOT)
//!
//! Owns geometry, activation, palette, playback and hover state for one
//! visualization session, and exposes the control surface the UI layer may
//! call: `set_time_index`, `play`, `pause`, `set_color_scale`, `on_hover`.
//!
//! Recomputation is explicit. Every mutation marks the color buffer dirty;
//! `refresh()` (or `render_frame()`, which calls it) rebuilds it. Nothing is
//! recomputed behind the caller's back.

use serde::Serialize;

use crate::activation::{ActivationDataset, DataOrigin};
use crate::colorize;
use crate::config::Settings;
use crate::error::ViewerError;
use crate::geometry::{self, Point3, RenderMesh};
use crate::interaction::{HoverState, InteractionResolver, PickEvent};
use crate::palette::ColorScale;
use crate::payload::BrainPayload;
use crate::playback::{
    ManualTicker, PlaybackController, PlaybackState, TickOutcome, TickScheduler, TickToken,
};

pub type HoverCallback = Box<dyn FnMut(&HoverState)>;

/// Everything the external renderer needs for one frame
#[derive(Debug, Serialize)]
pub struct RenderFrame<'a> {
    pub positions: &'a [f32],
    pub indices: &'a [u32],
    pub normals: &'a [f32],
    pub colors: &'a [f32],
    pub time_index: usize,
    pub time_s: Option<f64>,
    pub palette: ColorScale,
    /// Uniform mesh scale (emphasis toggle)
    pub scale: f32,
}

pub struct BrainViewer<S: TickScheduler = ManualTicker> {
    vertices: Vec<Point3>,
    geometry: Option<RenderMesh>,
    dataset: ActivationDataset,
    palette: ColorScale,
    playback: PlaybackController,
    interaction: InteractionResolver,
    scheduler: S,
    colors: Vec<f32>,
    dirty: bool,
    fault: Option<ViewerError>,
    hover_callbacks: Vec<HoverCallback>,
    time_step: f64,
}

impl BrainViewer<ManualTicker> {
    /// Session whose ticks are delivered by hand
    pub fn new(payload: BrainPayload, settings: &Settings) -> Self {
        Self::with_scheduler(payload, settings, ManualTicker::new())
    }
}

impl<S: TickScheduler> BrainViewer<S> {
    pub fn with_scheduler(payload: BrainPayload, settings: &Settings, scheduler: S) -> Self {
        let mut viewer = Self {
            vertices: Vec::new(),
            geometry: None,
            dataset: ActivationDataset::empty(),
            palette: settings.palette,
            playback: PlaybackController::new(settings.playback.interval_ms, 0),
            interaction: InteractionResolver::new(settings.emphasis_scale),
            scheduler,
            colors: Vec::new(),
            dirty: true,
            fault: None,
            hover_callbacks: Vec::new(),
            time_step: settings.synthetic.time_step_s,
        };

        viewer.load(payload);
        if settings.playback.autoplay {
            viewer.play();
        }
        viewer
    }

    /// Replace geometry and activation. Rewinds to frame 0 and leaves the
    /// play/pause state alone.
    pub fn load(&mut self, payload: BrainPayload) {
        self.fault = None;
        self.geometry = match geometry::assemble(&payload.vertices, &payload.faces) {
            Ok(mesh) => Some(mesh),
            Err(e) => {
                self.report(e);
                None
            }
        };
        self.vertices = payload.vertices;
        self.pointer_out();
        self.set_activation(payload.times, payload.activation_data);
    }

    /// Replace only the activation data
    pub fn set_activation(&mut self, times: Vec<f64>, frames: Vec<Vec<f32>>) {
        self.dataset = if self.geometry.is_some() {
            let (dataset, fault) =
                ActivationDataset::resolve(times, frames, &self.vertices, self.time_step);
            if let Some(e) = fault {
                self.report(e);
            }
            dataset
        } else {
            ActivationDataset::empty()
        };

        self.playback.reset(self.dataset.frame_count());
        self.dirty = true;

        tracing::info!(
            frames = self.dataset.frame_count(),
            origin = ?self.dataset.origin(),
            "Activation dataset loaded"
        );
    }

    fn report(&mut self, e: ViewerError) {
        crate::log_fault!(e);
        self.fault = Some(e);
    }

    // ------------------------------------------------------------------
    // Control surface
    // ------------------------------------------------------------------

    /// Scrub to a frame; indices past the end wrap
    pub fn set_time_index(&mut self, index: usize) -> usize {
        let index = self.playback.set_time_index(index);
        self.dirty = true;
        index
    }

    /// Start playback. False if already playing.
    pub fn play(&mut self) -> bool {
        match self.playback.play() {
            Some(token) => {
                self.scheduler.schedule(token, self.playback.interval());
                true
            }
            None => false,
        }
    }

    /// Stop playback and cancel the pending tick. False if already stopped.
    pub fn pause(&mut self) -> bool {
        if self.playback.pause() {
            self.scheduler.cancel();
            true
        } else {
            false
        }
    }

    /// Select a palette by name; unknown names select rainbow
    pub fn set_color_scale(&mut self, name: &str) -> ColorScale {
        self.set_palette(ColorScale::from_name(name));
        self.palette
    }

    pub fn set_palette(&mut self, palette: ColorScale) {
        if self.palette != palette {
            self.palette = palette;
            self.dirty = true;
        }
    }

    /// Subscribe to hover changes
    pub fn on_hover(&mut self, callback: impl FnMut(&HoverState) + 'static) {
        self.hover_callbacks.push(Box::new(callback));
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Deliver a scheduler tick. Stale tokens change nothing.
    pub fn on_tick(&mut self, token: TickToken) -> TickOutcome {
        let outcome = self.playback.on_tick(token);
        if let TickOutcome::Advanced(_) = outcome {
            self.dirty = true;
        }
        outcome
    }

    pub fn pointer_over(&mut self, event: PickEvent) -> HoverState {
        let hover = self
            .interaction
            .pointer_over(event, &self.dataset, self.playback.time_index());
        self.notify_hover(&hover);
        hover
    }

    pub fn pointer_out(&mut self) -> HoverState {
        let hover = self.interaction.pointer_out();
        self.notify_hover(&hover);
        hover
    }

    /// Toggle emphasis, returning the new mesh scale
    pub fn pointer_down(&mut self) -> f32 {
        self.interaction.pointer_down()
    }

    fn notify_hover(&mut self, hover: &HoverState) {
        for callback in self.hover_callbacks.iter_mut() {
            callback(hover);
        }
    }

    // ------------------------------------------------------------------
    // Recompute + output
    // ------------------------------------------------------------------

    /// Rebuild the color buffer if anything changed. Returns true if it did.
    pub fn refresh(&mut self) -> bool {
        if !self.dirty {
            return false;
        }

        let time_index = self.playback.time_index();
        self.colors = match &self.geometry {
            Some(_) => colorize::colorize_frame(&self.dataset, time_index, self.palette)
                .unwrap_or_default(),
            None => Vec::new(),
        };
        self.interaction.refresh_value(&self.dataset, time_index);
        self.dirty = false;
        true
    }

    /// Current frame buffers, or None when there is no geometry
    pub fn render_frame(&mut self) -> Option<RenderFrame<'_>> {
        self.refresh();
        let mesh = self.geometry.as_ref()?;
        let time_index = self.playback.time_index();

        Some(RenderFrame {
            positions: mesh.positions(),
            indices: mesh.indices(),
            normals: mesh.normals(),
            colors: &self.colors,
            time_index,
            time_s: self.dataset.time_at(time_index),
            palette: self.palette,
            scale: self.interaction.scale(),
        })
    }

    /// Stop playback for good; called on drop as well
    pub fn dispose(&mut self) {
        self.playback.pause();
        self.scheduler.cancel();
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn geometry(&self) -> Option<&RenderMesh> {
        self.geometry.as_ref()
    }

    pub fn dataset(&self) -> &ActivationDataset {
        &self.dataset
    }

    pub fn data_origin(&self) -> DataOrigin {
        self.dataset.origin()
    }

    pub fn palette(&self) -> ColorScale {
        self.palette
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn time_index(&self) -> usize {
        self.playback.time_index()
    }

    pub fn hover(&self) -> &HoverState {
        self.interaction.hover()
    }

    pub fn mesh_scale(&self) -> f32 {
        self.interaction.scale()
    }

    /// Structural problem found during the last load, if any
    pub fn fault(&self) -> Option<&ViewerError> {
        self.fault.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// (min, max) of the current frame's values
    pub fn current_range(&self) -> Option<(f32, f32)> {
        self.dataset
            .frame_at(self.playback.time_index())
            .map(colorize::frame_range)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

impl<S: TickScheduler> Drop for BrainViewer<S> {
    fn drop(&mut self) {
        self.scheduler.cancel();
    }
}
