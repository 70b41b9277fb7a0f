//! Signals leaving the core: telemetry events, hardware triggers,
//! on-screen feedback and rejection reasons.
//!
//! The core never performs I/O. Events are queued in order and handed to a
//! `TelemetrySink`; a failing sink is logged and ignored.

use crate::placement::{PlacementOutcome, Zone};
use crate::types::BlockLayer;
use serde::Serialize;
use thiserror::Error;

/// Structured telemetry event, serialised with a `type` tag.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TelemetryEvent {
    #[serde(rename_all = "camelCase")]
    TrialStarted {
        trial: u32,
        elapsed_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    DroppedBlock {
        layer: BlockLayer,
        #[serde(skip_serializing_if = "Option::is_none")]
        zone: Option<Zone>,
        start_position: [i32; 2],
        end_position: [i32; 2],
        drag_ms: u64,
        elapsed_ms: u64,
        new_shape: Vec<[i32; 2]>,
    },
    #[serde(rename_all = "camelCase")]
    CorrectPlacement {
        trial: u32,
        position: [i32; 2],
        elapsed_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    WrongPosition {
        trial: u32,
        dropped_at: [i32; 2],
        position: [i32; 2],
        elapsed_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    EarlyRelease {
        trial: u32,
        dropped_at: [i32; 2],
        position: [i32; 2],
        elapsed_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    AddedShape {
        gallery_index: usize,
        shape: Vec<[i32; 2]>,
        time_since_last_drop_ms: u64,
        elapsed_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    SelectedShape {
        shape_index: usize,
        shape: Vec<[i32; 2]>,
        is_selected: bool,
    },
    #[serde(rename_all = "camelCase")]
    DoneSelection {
        shape_indices: Vec<usize>,
        shapes: Vec<Vec<[i32; 2]>>,
    },
}

impl TelemetryEvent {
    /// Event name as it appears in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            TelemetryEvent::TrialStarted { .. } => "trialStarted",
            TelemetryEvent::DroppedBlock { .. } => "droppedBlock",
            TelemetryEvent::CorrectPlacement { .. } => "correctPlacement",
            TelemetryEvent::WrongPosition { .. } => "wrongPosition",
            TelemetryEvent::EarlyRelease { .. } => "earlyRelease",
            TelemetryEvent::AddedShape { .. } => "addedShape",
            TelemetryEvent::SelectedShape { .. } => "selectedShape",
            TelemetryEvent::DoneSelection { .. } => "doneSelection",
        }
    }

    /// Scoring event for a resolved trial drop.
    pub fn for_placement(
        outcome: PlacementOutcome,
        trial: u32,
        dropped_at: [i32; 2],
        position: [i32; 2],
        elapsed_ms: u64,
    ) -> Self {
        match outcome {
            PlacementOutcome::CorrectPlacement => TelemetryEvent::CorrectPlacement {
                trial,
                position,
                elapsed_ms,
            },
            PlacementOutcome::WrongPosition => TelemetryEvent::WrongPosition {
                trial,
                dropped_at,
                position,
                elapsed_ms,
            },
            PlacementOutcome::EarlyRelease => TelemetryEvent::EarlyRelease {
                trial,
                dropped_at,
                position,
                elapsed_ms,
            },
        }
    }
}

/// Hardware trigger codes sent to the recording rig.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    LoadGame,
    StartGame,
    CollectShape,
    EndGame,
    ChooseGalleryShape,
    GalleryDone,
}

impl Trigger {
    pub fn code(self) -> u8 {
        match self {
            Trigger::LoadGame => 100,
            Trigger::StartGame => 3,
            Trigger::CollectShape => 4,
            Trigger::EndGame => 5,
            Trigger::ChooseGalleryShape => 6,
            Trigger::GalleryDone => 7,
        }
    }
}

/// Message the front end shows after an interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Feedback {
    WrongColor,
    WrongPosition,
    Correct,
    EarlyRelease,
}

impl From<PlacementOutcome> for Feedback {
    fn from(outcome: PlacementOutcome) -> Self {
        match outcome {
            PlacementOutcome::CorrectPlacement => Feedback::Correct,
            PlacementOutcome::WrongPosition => Feedback::WrongPosition,
            PlacementOutcome::EarlyRelease => Feedback::EarlyRelease,
        }
    }
}

/// Why an interaction was ignored. The task stays interactive after any of
/// these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rejection {
    #[error("a drag is already in progress")]
    DragInProgress,
    #[error("no drag is in progress")]
    NoDragInProgress,
    #[error("the search time limit has elapsed")]
    TimeExpired,
    #[error("only blocks of the target colour can be moved")]
    WrongColor,
    #[error("moving this block would split the shape")]
    NotMovable,
    #[error("no block at that cell")]
    UnknownBlock,
    #[error("trial blocks are locked until the next reset")]
    TrialLocked,
    #[error("the trial cannot change before a block is moved")]
    TrialNotFinished,
    #[error("no trials left")]
    LastTrial,
    #[error("the shape has not changed since it was last collected")]
    ShapeUnchanged,
    #[error("collecting shapes is disabled")]
    CollectDisabled,
    #[error("five shapes are already selected")]
    SelectionFull,
    #[error("exactly five shapes must be selected")]
    SelectionIncomplete,
    #[error("no gallery shape at that index")]
    OutOfRange,
    #[error("not available in the current phase")]
    WrongPhase,
    #[error("ending early is not allowed")]
    EarlyExitDisabled,
    #[error("at least five shapes are needed")]
    NotEnoughShapes,
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry transport unavailable")]
    Unavailable,
    #[error("telemetry delivery failed: {0}")]
    Delivery(String),
}

/// Outbound transport for events and triggers.
pub trait TelemetrySink {
    fn emit(&mut self, event: &TelemetryEvent) -> Result<(), TelemetryError>;

    fn trigger(&mut self, trigger: Trigger) -> Result<(), TelemetryError>;
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn emit(&mut self, _event: &TelemetryEvent) -> Result<(), TelemetryError> {
        Ok(())
    }

    fn trigger(&mut self, _trigger: Trigger) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Sink that keeps everything in memory, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<TelemetryEvent>,
    pub triggers: Vec<Trigger>,
}

impl RecordingSink {
    pub fn names(&self) -> Vec<&'static str> {
        self.events.iter().map(TelemetryEvent::name).collect()
    }
}

impl TelemetrySink for RecordingSink {
    fn emit(&mut self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        self.events.push(event.clone());
        Ok(())
    }

    fn trigger(&mut self, trigger: Trigger) -> Result<(), TelemetryError> {
        self.triggers.push(trigger);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_codes() {
        assert_eq!(Trigger::LoadGame.code(), 100);
        assert_eq!(Trigger::StartGame.code(), 3);
        assert_eq!(Trigger::CollectShape.code(), 4);
        assert_eq!(Trigger::EndGame.code(), 5);
        assert_eq!(Trigger::ChooseGalleryShape.code(), 6);
        assert_eq!(Trigger::GalleryDone.code(), 7);
    }

    #[test]
    fn test_event_serialises_with_type_tag() {
        let ev = TelemetryEvent::AddedShape {
            gallery_index: 0,
            shape: vec![[0, 0], [1, 0]],
            time_since_last_drop_ms: 40,
            elapsed_ms: 1000,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "addedShape");
        assert_eq!(json["shape"], serde_json::json!([[0, 0], [1, 0]]));
        assert_eq!(json["timeSinceLastDropMs"], 40);
        assert_eq!(ev.name(), "addedShape");
    }

    #[test]
    fn test_for_placement_maps_outcome() {
        let ev = TelemetryEvent::for_placement(
            PlacementOutcome::EarlyRelease,
            2,
            [9, 0],
            [2, 0],
            10,
        );
        assert_eq!(ev.name(), "earlyRelease");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["droppedAt"], serde_json::json!([9, 0]));
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let mut sink = RecordingSink::default();
        sink.trigger(Trigger::LoadGame).unwrap();
        sink.emit(&TelemetryEvent::TrialStarted { trial: 1, elapsed_ms: 0 })
            .unwrap();
        assert_eq!(sink.triggers, vec![Trigger::LoadGame]);
        assert_eq!(sink.names(), vec!["trialStarted"]);
    }
}
