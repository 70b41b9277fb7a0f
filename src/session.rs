//! Trial/shape session: owns every shape the player touches during the
//! search phase and runs the drag lifecycle over them.
//!
//! Two block layers live side by side:
//! - the trial layer (source + target clusters), regenerated per trial;
//!   only target-coloured source blocks may be dragged, and one drop locks
//!   the trial until it is reset or advanced;
//! - the player's own free-form shape, where a block may be lifted only if
//!   the rest stays connected, and which is snapshotted by `collect_shape`.
//!
//! Only one drag exists at a time across both layers. A drop is fully
//! resolved before `end_drag` returns, so no interaction can interleave
//! with it. All time values are milliseconds since the search phase began.

use crate::config::{ConfigError, TaskConfig};
use crate::connectivity::{can_remove, movable_cells};
use crate::events::{Feedback, Rejection, TelemetryEvent};
use crate::frontier::{target_slots, TargetSlots};
use crate::geometry::{centering_offset, CELL_SIZE};
use crate::highlight::{highlight_color, BLOCK_COLOR};
use crate::layout::{TrialLayout, TARGET_COLOR};
use crate::placement::{resolve_drop, snap_to_frontier, Placement, Zone};
use crate::rng::TaskRng;
use crate::types::{BlockColor, BlockLayer, GridPoint, Orientation, PixelPos, Shape};
use serde::Serialize;
use std::collections::HashMap;

/// Length of the search phase.
pub const MAX_SEARCH_TIME_MS: u64 = 12 * 60 * 1000;

/// Blocks in a fresh free-form shape.
pub const OWN_SHAPE_LEN: usize = 10;

/// Per-move interaction state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DragPhase {
    AwaitingDrag,
    Dragging,
}

#[derive(Clone, Copy, Debug)]
struct DragState {
    layer: BlockLayer,
    start: GridPoint,
    color: BlockColor,
    pointer: PixelPos,
    started_at_ms: u64,
}

/// What happened to a dropped block.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropReport {
    pub layer: BlockLayer,
    pub start: GridPoint,
    pub end: GridPoint,
    /// Set for trial drops only.
    pub placement: Option<Placement>,
}

/// A snapshot handed to the gallery by `collect_shape`.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectedShape {
    pub shape: Shape,
    pub time_since_last_drop_ms: u64,
}

/// One block as the render collaborator sees it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BlockView {
    pub cell: GridPoint,
    pub color: BlockColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragView {
    pub layer: BlockLayer,
    pub start: GridPoint,
    pub pointer: PixelPos,
    pub color: BlockColor,
}

/// Read-only view of the session for rendering.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub trial: u32,
    pub trials: u32,
    pub orientation: Orientation,
    pub source: Vec<BlockView>,
    pub target: Vec<BlockView>,
    pub target_slots: Option<TargetSlots>,
    pub own: Vec<BlockView>,
    pub highlighted: Vec<BlockView>,
    pub dragging: Option<DragView>,
    pub feedback: Option<Feedback>,
    pub can_change_trial: bool,
    pub trial_interactive: bool,
    pub shape_changed: bool,
    pub times_up: bool,
    pub trial_offset: PixelPos,
    pub own_offset: PixelPos,
}

pub struct Session {
    config: TaskConfig,
    rng: TaskRng,
    time_limit_ms: u64,

    trial: u32,
    layout: TrialLayout,
    source: Shape,
    source_colors: HashMap<GridPoint, BlockColor>,
    target: Shape,
    can_change_trial: bool,
    trial_interactive: bool,
    feedback: Option<Feedback>,

    own: Shape,
    shape_changed: bool,
    collect_enabled: bool,
    highlighting: bool,

    drag: Option<DragState>,
    last_drop_ms: u64,
    elapsed_ms: u64,
    times_up: bool,
    outbox: Vec<TelemetryEvent>,
}

impl Session {
    /// Start a session on trial 1. Fails on malformed configuration.
    pub fn new(config: TaskConfig, mut rng: TaskRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let layout = TrialLayout::random(&mut rng);
        let mut session = Self {
            config,
            rng,
            time_limit_ms: MAX_SEARCH_TIME_MS,
            trial: 1,
            layout,
            source: Shape::new(),
            source_colors: HashMap::new(),
            target: Shape::new(),
            can_change_trial: false,
            trial_interactive: true,
            feedback: None,
            own: own_start_shape(),
            shape_changed: true,
            collect_enabled: true,
            highlighting: false,
            drag: None,
            last_drop_ms: 0,
            elapsed_ms: 0,
            times_up: false,
            outbox: Vec::new(),
        };
        session.rebuild_trial();
        session.outbox.push(TelemetryEvent::TrialStarted {
            trial: 1,
            elapsed_ms: 0,
        });
        log::info!("session started: {} trials, layout {:?}", config.trials, layout);
        Ok(session)
    }

    /// Override the search time limit.
    pub fn with_time_limit(mut self, limit_ms: u64) -> Self {
        self.time_limit_ms = limit_ms;
        self
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    // ─── Trial lifecycle ────────────────────────────────────────────────────

    /// Draw a new layout for the current trial number.
    pub fn start_trial(&mut self) {
        self.layout = TrialLayout::random(&mut self.rng);
        self.rebuild_trial();
        self.outbox.push(TelemetryEvent::TrialStarted {
            trial: self.trial,
            elapsed_ms: self.elapsed_ms,
        });
        log::info!("trial {} layout {:?}", self.trial, self.layout);
    }

    /// Rebuild the current layout from scratch.
    pub fn reset_trial(&mut self) {
        self.rebuild_trial();
        log::debug!("trial {} reset", self.trial);
    }

    /// Move on to the next trial once a block has been moved.
    pub fn advance_trial(&mut self) -> Result<u32, Rejection> {
        if self.drag.is_some() {
            return Err(Rejection::DragInProgress);
        }
        if !self.can_change_trial {
            return Err(Rejection::TrialNotFinished);
        }
        if self.trial >= self.config.trials {
            return Err(Rejection::LastTrial);
        }
        self.trial += 1;
        self.start_trial();
        Ok(self.trial)
    }

    fn rebuild_trial(&mut self) {
        if matches!(self.drag, Some(d) if d.layer == BlockLayer::Source) {
            self.drag = None;
        }
        let blocks = self.layout.source_blocks();
        self.source = Shape::from_cells(blocks.iter().map(|&(c, _)| c));
        self.source_colors = blocks.into_iter().collect();
        self.target = self.layout.target_shape();
        self.can_change_trial = false;
        self.trial_interactive = true;
        self.feedback = None;
    }

    pub fn trial(&self) -> u32 {
        self.trial
    }

    pub fn layout(&self) -> &TrialLayout {
        &self.layout
    }

    pub fn source(&self) -> &Shape {
        &self.source
    }

    pub fn target(&self) -> &Shape {
        &self.target
    }

    pub fn can_change_trial(&self) -> bool {
        self.can_change_trial
    }

    pub fn trial_interactive(&self) -> bool {
        self.trial_interactive
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    /// Current extension slots, computed from the live target shape.
    pub fn target_slots(&self) -> Option<TargetSlots> {
        target_slots(&self.target, self.layout.orientation)
    }

    pub fn source_color(&self, cell: GridPoint) -> Option<BlockColor> {
        self.source_colors.get(&cell).copied()
    }

    /// Source blocks the player may pick up right now.
    pub fn draggable_source(&self) -> Vec<GridPoint> {
        if !self.trial_interactive || self.drag.is_some() {
            return Vec::new();
        }
        self.source
            .cells()
            .iter()
            .copied()
            .filter(|c| self.source_colors.get(c) == Some(&TARGET_COLOR))
            .collect()
    }

    // ─── Time ───────────────────────────────────────────────────────────────

    /// Advance the clock. Idempotent for repeated timestamps.
    pub fn tick(&mut self, elapsed_ms: u64) {
        self.elapsed_ms = self.elapsed_ms.max(elapsed_ms);
        self.check_deadline(elapsed_ms);
    }

    /// True once the time limit has passed; latches.
    fn check_deadline(&mut self, elapsed_ms: u64) -> bool {
        if !self.times_up && elapsed_ms > self.time_limit_ms {
            self.times_up = true;
            log::info!("search time limit reached at {elapsed_ms} ms");
        }
        self.times_up
    }

    pub fn times_up(&self) -> bool {
        self.times_up
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    // ─── Drag lifecycle ─────────────────────────────────────────────────────

    pub fn drag_phase(&self) -> DragPhase {
        if self.drag.is_some() {
            DragPhase::Dragging
        } else {
            DragPhase::AwaitingDrag
        }
    }

    /// Pick up the block at `cell` on `layer`.
    ///
    /// Picking a source block of the wrong colour shows the wrong-colour
    /// message and locks the trial until the next reset.
    pub fn begin_drag(
        &mut self,
        layer: BlockLayer,
        cell: GridPoint,
        pointer: PixelPos,
        elapsed_ms: u64,
    ) -> Result<(), Rejection> {
        if self.drag.is_some() {
            return Err(Rejection::DragInProgress);
        }
        if self.check_deadline(elapsed_ms) {
            return Err(Rejection::TimeExpired);
        }

        let color = match layer {
            BlockLayer::Source => {
                if !self.trial_interactive {
                    return Err(Rejection::TrialLocked);
                }
                let color = self
                    .source_colors
                    .get(&cell)
                    .copied()
                    .ok_or(Rejection::UnknownBlock)?;
                if color != TARGET_COLOR {
                    self.feedback = Some(Feedback::WrongColor);
                    self.trial_interactive = false;
                    log::debug!("wrong colour picked at {cell:?}");
                    return Err(Rejection::WrongColor);
                }
                self.source.remove(cell);
                self.source_colors.remove(&cell);
                color
            }
            BlockLayer::Own => {
                if !self.own.contains(cell) {
                    return Err(Rejection::UnknownBlock);
                }
                if !can_remove(&self.own, cell) {
                    return Err(Rejection::NotMovable);
                }
                self.own.remove(cell);
                BLOCK_COLOR
            }
        };

        self.drag = Some(DragState {
            layer,
            start: cell,
            color,
            pointer,
            started_at_ms: elapsed_ms,
        });
        Ok(())
    }

    /// Track the pointer. No snapping happens until release.
    pub fn move_drag(&mut self, pointer: PixelPos) -> Result<(), Rejection> {
        let drag = self.drag.as_mut().ok_or(Rejection::NoDragInProgress)?;
        drag.pointer = pointer;
        Ok(())
    }

    /// Release the dragged block at `pointer` and resolve where it lands.
    pub fn end_drag(
        &mut self,
        pointer: PixelPos,
        elapsed_ms: u64,
    ) -> Result<DropReport, Rejection> {
        let drag = self.drag.take().ok_or(Rejection::NoDragInProgress)?;
        let drag_ms = elapsed_ms.saturating_sub(drag.started_at_ms);

        let report = match drag.layer {
            BlockLayer::Source => {
                let placement = resolve_drop(
                    pointer,
                    CELL_SIZE,
                    &self.source,
                    &self.target,
                    self.target_slots(),
                );
                let landed_in = match placement.zone {
                    Zone::Target => {
                        self.target.insert(placement.cell);
                        &self.target
                    }
                    Zone::Source => {
                        self.source.insert(placement.cell);
                        self.source_colors.insert(placement.cell, drag.color);
                        &self.source
                    }
                };
                let new_shape = landed_in.to_pairs();

                self.can_change_trial = true;
                self.trial_interactive = false;
                self.feedback = Some(placement.outcome.into());

                self.outbox.push(TelemetryEvent::DroppedBlock {
                    layer: drag.layer,
                    zone: Some(placement.zone),
                    start_position: drag.start.to_array(),
                    end_position: placement.cell.to_array(),
                    drag_ms,
                    elapsed_ms,
                    new_shape,
                });
                self.outbox.push(TelemetryEvent::for_placement(
                    placement.outcome,
                    self.trial,
                    placement.dropped.to_array(),
                    placement.cell.to_array(),
                    elapsed_ms,
                ));
                log::debug!(
                    "trial {} drop at {:?} -> {:?} ({:?})",
                    self.trial,
                    placement.dropped,
                    placement.cell,
                    placement.outcome
                );

                DropReport {
                    layer: drag.layer,
                    start: drag.start,
                    end: placement.cell,
                    placement: Some(placement),
                }
            }
            BlockLayer::Own => {
                let cell = snap_to_frontier(pointer, CELL_SIZE, &self.own);
                self.own.insert(cell);
                self.shape_changed = true;

                self.outbox.push(TelemetryEvent::DroppedBlock {
                    layer: drag.layer,
                    zone: None,
                    start_position: drag.start.to_array(),
                    end_position: cell.to_array(),
                    drag_ms,
                    elapsed_ms,
                    new_shape: self.own.to_pairs(),
                });
                log::debug!("own shape block {:?} -> {:?}", drag.start, cell);

                DropReport {
                    layer: drag.layer,
                    start: drag.start,
                    end: cell,
                    placement: None,
                }
            }
        };

        self.last_drop_ms = elapsed_ms;
        self.elapsed_ms = self.elapsed_ms.max(elapsed_ms);
        Ok(report)
    }

    // ─── Free-form shape ────────────────────────────────────────────────────

    pub fn own_shape(&self) -> &Shape {
        &self.own
    }

    pub fn shape_changed(&self) -> bool {
        self.shape_changed
    }

    /// Allow or block `collect_shape` (blocked during parts of training).
    pub fn set_collect_enabled(&mut self, enabled: bool) {
        self.collect_enabled = enabled;
    }

    /// Snapshot the free-form shape for the gallery.
    pub fn collect_shape(&mut self, elapsed_ms: u64) -> Result<CollectedShape, Rejection> {
        if !self.collect_enabled {
            return Err(Rejection::CollectDisabled);
        }
        if self.check_deadline(elapsed_ms) {
            return Err(Rejection::TimeExpired);
        }
        if self.drag.is_some() {
            return Err(Rejection::DragInProgress);
        }
        if !self.shape_changed {
            return Err(Rejection::ShapeUnchanged);
        }
        self.shape_changed = false;
        Ok(CollectedShape {
            shape: self.own.clone(),
            time_since_last_drop_ms: elapsed_ms.saturating_sub(self.last_drop_ms),
        })
    }

    /// Put the free-form shape back to a straight row of blocks.
    pub fn reset_own_shape(&mut self) {
        self.cancel_own_drag();
        self.own = own_start_shape();
        self.shape_changed = true;
    }

    /// Remove every free-form block.
    pub fn clear_own_shape(&mut self) {
        self.cancel_own_drag();
        self.own.clear();
        self.shape_changed = true;
    }

    fn cancel_own_drag(&mut self) {
        if matches!(self.drag, Some(d) if d.layer == BlockLayer::Own) {
            self.drag = None;
        }
    }

    /// Free-form blocks that can be lifted without splitting the shape.
    pub fn movable_own(&self) -> Vec<GridPoint> {
        movable_cells(&self.own)
    }

    pub fn highlight_movable(&mut self) {
        self.highlighting = true;
    }

    pub fn unhighlight_movable(&mut self) {
        self.highlighting = false;
    }

    /// Highlighted blocks with their animated colour at `elapsed_ms`.
    pub fn highlighted(&self, elapsed_ms: u64) -> Vec<BlockView> {
        if !self.highlighting || self.drag.is_some() {
            return Vec::new();
        }
        let color = highlight_color(elapsed_ms);
        self.movable_own()
            .into_iter()
            .map(|cell| BlockView { cell, color })
            .collect()
    }

    // ─── Output ─────────────────────────────────────────────────────────────

    /// Take every queued telemetry event, oldest first.
    pub fn drain_events(&mut self) -> Vec<TelemetryEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn snapshot(&self, elapsed_ms: u64) -> SessionSnapshot {
        let source: Vec<BlockView> = self
            .source
            .cells()
            .iter()
            .map(|&cell| BlockView {
                cell,
                color: self.source_colors.get(&cell).copied().unwrap_or(TARGET_COLOR),
            })
            .collect();
        let target: Vec<BlockView> = self
            .target
            .cells()
            .iter()
            .map(|&cell| BlockView {
                cell,
                color: TARGET_COLOR,
            })
            .collect();
        let own = self
            .own
            .cells()
            .iter()
            .map(|&cell| BlockView {
                cell,
                color: BLOCK_COLOR,
            })
            .collect();

        let mut trial_cells: Vec<GridPoint> = self.source.cells().to_vec();
        trial_cells.extend_from_slice(self.target.cells());

        SessionSnapshot {
            trial: self.trial,
            trials: self.config.trials,
            orientation: self.layout.orientation,
            source,
            target,
            target_slots: self.target_slots(),
            own,
            highlighted: self.highlighted(elapsed_ms),
            dragging: self.drag.map(|d| DragView {
                layer: d.layer,
                start: d.start,
                pointer: d.pointer,
                color: d.color,
            }),
            feedback: self.feedback,
            can_change_trial: self.can_change_trial,
            trial_interactive: self.trial_interactive,
            shape_changed: self.shape_changed,
            times_up: self.times_up,
            trial_offset: centering_offset(&trial_cells, CELL_SIZE),
            own_offset: centering_offset(self.own.cells(), CELL_SIZE),
        }
    }
}

fn own_start_shape() -> Shape {
    Shape::line(GridPoint::new(0, 0), OWN_SHAPE_LEN, Orientation::Row)
}
