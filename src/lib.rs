//! WebAssembly core for the Creative Foraging Task.
//!
//! The player drags blocks on a grid: in training trials a coloured block
//! is moved from a source cluster onto a target line, and in the search
//! phase a ten-block free-form shape is reshaped and collected into a
//! gallery. This crate owns the grid rules (connectivity, frontier,
//! placement) and the task state machine; rendering, audio and transport
//! stay on the JavaScript side.
//!
//! Cells are passed to JavaScript as flat `Int32Array`s of `x, y` pairs.

pub mod config;
pub mod connectivity;
pub mod events;
pub mod frontier;
pub mod gallery;
pub mod geometry;
pub mod highlight;
pub mod layout;
pub mod placement;
pub mod rng;
pub mod session;
pub mod task;
pub mod types;

// ─── WASM Exports (only compiled for wasm32 target) ─────────────────────────

#[cfg(target_arch = "wasm32")]
mod wasm_exports {
    use wasm_bindgen::prelude::*;
    use crate::config::TaskConfig;
    use crate::events::{TelemetryError, TelemetryEvent, TelemetrySink, Trigger};
    use crate::gallery::Gallery;
    use crate::geometry::CELL_SIZE;
    use crate::rng::TaskRng;
    use crate::task::TaskController;
    use crate::types::{BlockLayer, GridPoint, PixelPos};

    /// Forwards telemetry to optional JS callbacks, buffering events when
    /// no event callback is registered.
    #[derive(Default)]
    struct JsSink {
        on_event: Option<js_sys::Function>,
        on_trigger: Option<js_sys::Function>,
        pending: Vec<TelemetryEvent>,
    }

    fn delivery(err: JsValue) -> TelemetryError {
        TelemetryError::Delivery(format!("{err:?}"))
    }

    impl TelemetrySink for JsSink {
        fn emit(&mut self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
            let Some(callback) = &self.on_event else {
                self.pending.push(event.clone());
                return Ok(());
            };
            let value = serde_wasm_bindgen::to_value(event)
                .map_err(|e| TelemetryError::Delivery(e.to_string()))?;
            callback.call1(&JsValue::NULL, &value).map_err(delivery)?;
            Ok(())
        }

        fn trigger(&mut self, trigger: Trigger) -> Result<(), TelemetryError> {
            if let Some(callback) = &self.on_trigger {
                callback
                    .call1(&JsValue::NULL, &JsValue::from(trigger.code()))
                    .map_err(delivery)?;
            }
            Ok(())
        }
    }

    fn parse_layer(layer: &str) -> Result<BlockLayer, JsError> {
        match layer {
            "source" => Ok(BlockLayer::Source),
            "own" => Ok(BlockLayer::Own),
            other => Err(JsError::new(&format!("unknown block layer {other:?}"))),
        }
    }

    fn cells_to_array(cells: &[GridPoint]) -> js_sys::Int32Array {
        let flat: Vec<i32> = cells.iter().flat_map(|c| [c.x, c.y]).collect();
        let arr = js_sys::Int32Array::new_with_length(flat.len() as u32);
        arr.copy_from(&flat);
        arr
    }

    fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(value).map_err(|e| JsError::new(&e.to_string()))
    }

    /// One running task. Times are milliseconds since the current phase began.
    #[wasm_bindgen(js_name = "ForagingTask")]
    pub struct WasmTask {
        inner: TaskController<JsSink>,
    }

    #[wasm_bindgen(js_class = "ForagingTask")]
    impl WasmTask {
        /// Build from URL search parameters, e.g. `?trials=10&showResults=0`.
        #[wasm_bindgen(constructor)]
        pub fn new(query: &str) -> Result<WasmTask, JsError> {
            let config = TaskConfig::from_query(query)?;
            Self::build(config, JsSink::default())
        }

        /// Build from a config object `{ trials, allowEarlyExit, showResults }`.
        #[wasm_bindgen(js_name = "fromConfig")]
        pub fn from_config(
            config: JsValue,
            on_event: Option<js_sys::Function>,
            on_trigger: Option<js_sys::Function>,
        ) -> Result<WasmTask, JsError> {
            let config: TaskConfig = if config.is_undefined() || config.is_null() {
                TaskConfig::default()
            } else {
                serde_wasm_bindgen::from_value(config)
                    .map_err(|e| JsError::new(&e.to_string()))?
            };
            Self::build(config, JsSink { on_event, on_trigger, pending: Vec::new() })
        }

        fn build(config: TaskConfig, sink: JsSink) -> Result<WasmTask, JsError> {
            let inner = TaskController::new(config, TaskRng::new(), sink)?;
            Ok(WasmTask { inner })
        }

        #[wasm_bindgen(js_name = "startGame")]
        pub fn start_game(&mut self) -> Result<(), JsError> {
            Ok(self.inner.start_game()?)
        }

        pub fn tick(&mut self, elapsed_ms: f64) {
            self.inner.tick(elapsed_ms as u64);
        }

        /// Start dragging the block of `layer` (`"source"` or `"own"`) at
        /// grid cell `(x, y)`. Returns `false` if the block cannot move.
        #[wasm_bindgen(js_name = "pointerDown")]
        pub fn pointer_down(
            &mut self,
            layer: &str,
            x: i32,
            y: i32,
            px: f64,
            py: f64,
            elapsed_ms: f64,
        ) -> Result<bool, JsError> {
            let layer = parse_layer(layer)?;
            let result = self.inner.pointer_down(
                layer,
                GridPoint::new(x, y),
                PixelPos::new(px, py),
                elapsed_ms as u64,
            );
            Ok(result.is_ok())
        }

        #[wasm_bindgen(js_name = "pointerMove")]
        pub fn pointer_move(&mut self, px: f64, py: f64) -> bool {
            self.inner.pointer_move(PixelPos::new(px, py)).is_ok()
        }

        /// Drop the dragged block. Returns the drop report, or `null` when
        /// nothing was being dragged.
        #[wasm_bindgen(js_name = "pointerUp")]
        pub fn pointer_up(
            &mut self,
            px: f64,
            py: f64,
            elapsed_ms: f64,
        ) -> Result<JsValue, JsError> {
            match self.inner.pointer_up(PixelPos::new(px, py), elapsed_ms as u64) {
                Ok(report) => to_js(&report),
                Err(reason) => {
                    log::debug!("drop ignored: {reason}");
                    Ok(JsValue::NULL)
                }
            }
        }

        #[wasm_bindgen(js_name = "resetTrial")]
        pub fn reset_trial(&mut self) -> Result<(), JsError> {
            Ok(self.inner.reset_trial()?)
        }

        #[wasm_bindgen(js_name = "nextTrial")]
        pub fn next_trial(&mut self) -> Result<u32, JsError> {
            Ok(self.inner.advance_trial()?)
        }

        #[wasm_bindgen(js_name = "resetShape")]
        pub fn reset_shape(&mut self) -> Result<(), JsError> {
            Ok(self.inner.reset_own_shape()?)
        }

        #[wasm_bindgen(js_name = "clearShape")]
        pub fn clear_shape(&mut self) -> Result<(), JsError> {
            Ok(self.inner.clear_own_shape()?)
        }

        #[wasm_bindgen(js_name = "setHighlight")]
        pub fn set_highlight(&mut self, on: bool) {
            self.inner.set_highlight(on);
        }

        #[wasm_bindgen(js_name = "setCollectEnabled")]
        pub fn set_collect_enabled(&mut self, enabled: bool) {
            self.inner.set_collect_enabled(enabled);
        }

        /// Collect the free-form shape. Returns its gallery index.
        #[wasm_bindgen(js_name = "collectShape")]
        pub fn collect_shape(&mut self, elapsed_ms: f64) -> Result<usize, JsError> {
            Ok(self.inner.collect_shape(elapsed_ms as u64)?)
        }

        /// `"finished"` or `"needsConfirmation"`.
        #[wasm_bindgen(js_name = "attemptDone")]
        pub fn attempt_done(&mut self, elapsed_ms: f64) -> Result<JsValue, JsError> {
            let attempt = self.inner.attempt_done(elapsed_ms as u64)?;
            to_js(&attempt)
        }

        #[wasm_bindgen(js_name = "cancelDone")]
        pub fn cancel_done(&mut self) {
            self.inner.cancel_done();
        }

        #[wasm_bindgen(js_name = "confirmDone")]
        pub fn confirm_done(&mut self, elapsed_ms: f64) -> Result<(), JsError> {
            Ok(self.inner.confirm_done(elapsed_ms as u64)?)
        }

        #[wasm_bindgen(js_name = "toggleSelection")]
        pub fn toggle_selection(&mut self, index: usize) -> Result<bool, JsError> {
            Ok(self.inner.toggle_selection(index)?)
        }

        #[wasm_bindgen(js_name = "finishSelection")]
        pub fn finish_selection(&mut self) -> Result<JsValue, JsError> {
            let results = self.inner.finish_selection()?;
            to_js(&results)
        }

        /// Free-form shape cells as `[x0, y0, x1, y1, ...]`.
        #[wasm_bindgen(js_name = "ownShape")]
        pub fn own_shape(&self) -> js_sys::Int32Array {
            cells_to_array(self.inner.session().own_shape().cells())
        }

        /// Cells of gallery entry `index`, or an empty array.
        #[wasm_bindgen(js_name = "galleryShape")]
        pub fn gallery_shape(&self, index: usize) -> js_sys::Int32Array {
            let cells = self
                .inner
                .gallery()
                .get(index)
                .map(|s| s.cells())
                .unwrap_or(&[]);
            cells_to_array(cells)
        }

        #[wasm_bindgen(js_name = "galleryPageCount")]
        pub fn gallery_page_count(&self) -> usize {
            self.inner.gallery().page_count()
        }

        /// Gallery indices shown on `page`, in display order.
        #[wasm_bindgen(js_name = "galleryPage")]
        pub fn gallery_page(&self, page: usize) -> js_sys::Uint32Array {
            let indices: Vec<u32> = self.inner.gallery().page(page).map(|i| i as u32).collect();
            let arr = js_sys::Uint32Array::new_with_length(indices.len() as u32);
            arr.copy_from(&indices);
            arr
        }

        /// `[page, row, col]` of gallery entry `index`.
        #[wasm_bindgen(js_name = "galleryCell")]
        pub fn gallery_cell(index: usize) -> js_sys::Uint32Array {
            let (row, col) = Gallery::cell_of(index);
            let cell = [Gallery::page_of(index) as u32, row as u32, col as u32];
            let arr = js_sys::Uint32Array::new_with_length(3);
            arr.copy_from(&cell);
            arr
        }

        /// Full render state for the current phase.
        pub fn snapshot(&self, elapsed_ms: f64) -> Result<JsValue, JsError> {
            to_js(&self.inner.snapshot(elapsed_ms as u64))
        }

        /// Events queued while no event callback was registered.
        #[wasm_bindgen(js_name = "drainEvents")]
        pub fn drain_events(&mut self) -> Result<js_sys::Array, JsError> {
            let out = js_sys::Array::new();
            for event in self.inner.sink_mut().pending.drain(..) {
                out.push(&to_js(&event)?);
            }
            Ok(out)
        }

        #[wasm_bindgen(js_name = "cellSize")]
        pub fn cell_size() -> f64 {
            CELL_SIZE
        }
    }

    /// Ping function to verify WASM is loaded.
    #[wasm_bindgen(js_name = "ping")]
    pub fn wasm_ping() -> String {
        "WASM foraging core ready".to_string()
    }
}
