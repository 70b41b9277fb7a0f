//! Task-level controller: search phase, gallery review, results.
//!
//! Owns the session, the gallery and the selection, and is the only place
//! that talks to the telemetry sink. Sink failures are logged and dropped.

use crate::config::{ConfigError, TaskConfig};
use crate::events::{Rejection, TelemetryEvent, TelemetrySink, Trigger};
use crate::gallery::{search_score, Gallery, Selection, SELECTION_SIZE};
use crate::rng::TaskRng;
use crate::session::{DragPhase, DropReport, Session, SessionSnapshot};
use crate::types::{BlockLayer, GridPoint, PixelPos};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Search,
    Gallery,
    Results,
}

/// Answer to a request to end the search phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DoneAttempt {
    /// The search phase is over.
    Finished,
    /// The player must confirm with `confirm_done`.
    NeedsConfirmation,
}

/// What the results screen shows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsView {
    pub show_results: bool,
    pub score: f64,
    /// Rounded absolute score in percent.
    pub percent: u32,
    /// Positive score: rapid, broad search.
    pub rapid_search: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub phase: Phase,
    pub session: Option<SessionSnapshot>,
    pub gallery_len: usize,
    pub selected: Vec<usize>,
    pub confirm_pending: bool,
    pub results: Option<ResultsView>,
}

pub struct TaskController<S: TelemetrySink> {
    config: TaskConfig,
    phase: Phase,
    session: Session,
    gallery: Gallery,
    selection: Option<Selection>,
    confirm_pending: bool,
    search_time_ms: u64,
    score: Option<f64>,
    sink: S,
}

impl<S: TelemetrySink> TaskController<S> {
    pub fn new(config: TaskConfig, rng: TaskRng, sink: S) -> Result<Self, ConfigError> {
        let session = Session::new(config, rng)?;
        let mut task = Self {
            config,
            phase: Phase::Search,
            session,
            gallery: Gallery::new(),
            selection: None,
            confirm_pending: false,
            search_time_ms: 0,
            score: None,
            sink,
        };
        task.send(Trigger::LoadGame);
        task.flush();
        Ok(task)
    }

    /// Swap in a session with a different time limit (tests, demos).
    pub fn with_time_limit(mut self, limit_ms: u64) -> Self {
        self.session = self.session.with_time_limit(limit_ms);
        self
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn search_score(&self) -> Option<f64> {
        self.score
    }

    fn send(&mut self, trigger: Trigger) {
        if let Err(err) = self.sink.trigger(trigger) {
            log::warn!("trigger {:?} ({}) not delivered: {err}", trigger, trigger.code());
        }
    }

    fn emit(&mut self, event: TelemetryEvent) {
        if let Err(err) = self.sink.emit(&event) {
            log::warn!("telemetry event {} not delivered: {err}", event.name());
        }
    }

    /// Forward queued session events in order.
    fn flush(&mut self) {
        for event in self.session.drain_events() {
            self.emit(event);
        }
    }

    fn require(&self, phase: Phase) -> Result<(), Rejection> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(Rejection::WrongPhase)
        }
    }

    /// Begin the scored game after training: anything collected so far is
    /// discarded.
    pub fn start_game(&mut self) -> Result<(), Rejection> {
        self.require(Phase::Search)?;
        self.gallery = Gallery::new();
        self.session.reset_own_shape();
        self.session.set_collect_enabled(true);
        self.send(Trigger::StartGame);
        Ok(())
    }

    // ─── Search phase ───────────────────────────────────────────────────────

    /// Timer tick, elapsed since the current phase began.
    pub fn tick(&mut self, elapsed_ms: u64) {
        if self.phase == Phase::Search {
            self.session.tick(elapsed_ms);
        }
    }

    pub fn pointer_down(
        &mut self,
        layer: BlockLayer,
        cell: GridPoint,
        pointer: PixelPos,
        elapsed_ms: u64,
    ) -> Result<(), Rejection> {
        self.require(Phase::Search)?;
        let result = self.session.begin_drag(layer, cell, pointer, elapsed_ms);
        if let Err(reason) = result {
            log::debug!("drag on {layer:?} {cell:?} rejected: {reason}");
        }
        result
    }

    pub fn pointer_move(&mut self, pointer: PixelPos) -> Result<(), Rejection> {
        self.require(Phase::Search)?;
        self.session.move_drag(pointer)
    }

    pub fn pointer_up(
        &mut self,
        pointer: PixelPos,
        elapsed_ms: u64,
    ) -> Result<DropReport, Rejection> {
        self.require(Phase::Search)?;
        let report = self.session.end_drag(pointer, elapsed_ms)?;
        self.confirm_pending = false;
        self.flush();
        Ok(report)
    }

    pub fn reset_trial(&mut self) -> Result<(), Rejection> {
        self.require(Phase::Search)?;
        self.session.reset_trial();
        Ok(())
    }

    pub fn advance_trial(&mut self) -> Result<u32, Rejection> {
        self.require(Phase::Search)?;
        let trial = self.session.advance_trial()?;
        self.flush();
        Ok(trial)
    }

    pub fn reset_own_shape(&mut self) -> Result<(), Rejection> {
        self.require(Phase::Search)?;
        self.session.reset_own_shape();
        Ok(())
    }

    pub fn clear_own_shape(&mut self) -> Result<(), Rejection> {
        self.require(Phase::Search)?;
        self.session.clear_own_shape();
        Ok(())
    }

    pub fn set_highlight(&mut self, on: bool) {
        if on {
            self.session.highlight_movable();
        } else {
            self.session.unhighlight_movable();
        }
    }

    pub fn set_collect_enabled(&mut self, enabled: bool) {
        self.session.set_collect_enabled(enabled);
    }

    /// Store the free-form shape in the gallery. Returns its gallery index.
    pub fn collect_shape(&mut self, elapsed_ms: u64) -> Result<usize, Rejection> {
        self.require(Phase::Search)?;
        let collected = self.session.collect_shape(elapsed_ms)?;
        self.send(Trigger::CollectShape);

        let shape = collected.shape.to_pairs();
        let index = self.gallery.push(collected.shape);
        self.confirm_pending = false;
        self.emit(TelemetryEvent::AddedShape {
            gallery_index: index,
            shape,
            time_since_last_drop_ms: collected.time_since_last_drop_ms,
            elapsed_ms,
        });
        log::debug!("collected shape #{index}");
        Ok(index)
    }

    /// Ask to end the search phase.
    ///
    /// After the time limit the phase ends as soon as enough shapes exist.
    /// Before it, ending early must be allowed, enough shapes must exist,
    /// and the player must confirm.
    pub fn attempt_done(&mut self, elapsed_ms: u64) -> Result<DoneAttempt, Rejection> {
        self.require(Phase::Search)?;
        if self.session.drag_phase() == DragPhase::Dragging {
            return Err(Rejection::DragInProgress);
        }
        self.session.tick(elapsed_ms);
        let enough = self.gallery.len() >= SELECTION_SIZE;

        if self.session.times_up() {
            if !enough {
                return Err(Rejection::NotEnoughShapes);
            }
            self.finish_search(elapsed_ms);
            return Ok(DoneAttempt::Finished);
        }
        if !self.config.allow_early_exit {
            return Err(Rejection::EarlyExitDisabled);
        }
        if !enough {
            return Err(Rejection::NotEnoughShapes);
        }
        self.confirm_pending = true;
        Ok(DoneAttempt::NeedsConfirmation)
    }

    pub fn cancel_done(&mut self) {
        self.confirm_pending = false;
    }

    pub fn confirm_done(&mut self, elapsed_ms: u64) -> Result<(), Rejection> {
        self.require(Phase::Search)?;
        if !self.confirm_pending {
            return Err(Rejection::WrongPhase);
        }
        self.finish_search(elapsed_ms);
        Ok(())
    }

    fn finish_search(&mut self, elapsed_ms: u64) {
        self.send(Trigger::EndGame);
        self.confirm_pending = false;
        self.search_time_ms = elapsed_ms;
        self.selection = Some(Selection::new());
        self.phase = Phase::Gallery;
        log::info!(
            "search finished after {} ms with {} shapes",
            self.search_time_ms,
            self.gallery.len()
        );
    }

    // ─── Gallery phase ──────────────────────────────────────────────────────

    /// Toggle a favourite. Returns whether it is selected afterwards.
    pub fn toggle_selection(&mut self, index: usize) -> Result<bool, Rejection> {
        self.require(Phase::Gallery)?;
        let len = self.gallery.len();
        let selection = self.selection.get_or_insert_with(Selection::new);
        let is_selected = selection.toggle(index, len)?;

        self.send(Trigger::ChooseGalleryShape);
        let shape = self
            .gallery
            .get(index)
            .map(|s| s.to_pairs())
            .unwrap_or_default();
        self.emit(TelemetryEvent::SelectedShape {
            shape_index: index,
            shape,
            is_selected,
        });
        Ok(is_selected)
    }

    /// Close the gallery review with exactly five favourites.
    pub fn finish_selection(&mut self) -> Result<ResultsView, Rejection> {
        self.require(Phase::Gallery)?;
        let complete = self.selection.as_ref().is_some_and(Selection::is_complete);
        if !complete {
            return Err(Rejection::SelectionIncomplete);
        }
        let selection = self.selection.take().unwrap_or_default();

        let shapes = selection
            .indices()
            .iter()
            .filter_map(|&i| self.gallery.get(i))
            .map(|s| s.to_pairs())
            .collect();
        self.send(Trigger::GalleryDone);
        self.emit(TelemetryEvent::DoneSelection {
            shape_indices: selection.indices().to_vec(),
            shapes,
        });

        let score = search_score(self.gallery.len(), self.search_time_ms);
        self.score = Some(score);
        self.phase = Phase::Results;
        log::info!("selection done, search score {score:.3}");
        Ok(self.results_view(score))
    }

    fn results_view(&self, score: f64) -> ResultsView {
        ResultsView {
            show_results: self.config.show_results,
            score,
            percent: (score.abs() * 100.0).round() as u32,
            rapid_search: score > 0.0,
        }
    }

    pub fn results(&self) -> Option<ResultsView> {
        self.score.map(|s| self.results_view(s))
    }

    pub fn snapshot(&self, elapsed_ms: u64) -> TaskSnapshot {
        TaskSnapshot {
            phase: self.phase,
            session: (self.phase == Phase::Search).then(|| self.session.snapshot(elapsed_ms)),
            gallery_len: self.gallery.len(),
            selected: self
                .selection
                .as_ref()
                .map(|s| s.indices().to_vec())
                .unwrap_or_default(),
            confirm_pending: self.confirm_pending,
            results: self.results(),
        }
    }
}
