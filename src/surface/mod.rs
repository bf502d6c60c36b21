//! Control Surface Module
//!
//! This module turns raw touches on a speaker floor plan into control messages for the
//! mixing server. It is organized into sub-modules, each with a specific responsibility:
//!
//! - [`geometry`]: Mapping between venue meters and screen pixels
//! - [`panning`]: Distance-based speaker gains and fader scaling
//! - [`floor_plan`]: Speakers and the floor-plan deck
//! - [`fader_map`]: Speaker id to fader channel patch
//! - [`throttle`]: Rate- and threshold-gated emission of continuous values
//! - [`selection`]: Per-floor-plan selection and mute state
//! - [`gesture`]: Touch classification and routing
//! - [`session`]: The session object tying the pieces together
//! - [`sink`]: Outbound message ring and logger setup
//!
//! The [`ControlSurface`] class exposes a session to Python; the transport drains the
//! produced messages through a [`MessageOutlet`].

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use rtrb::Consumer;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use crate::messages::{ControlMessage, TouchEvent, TouchPhase};
use crate::surface::config::SurfaceConfig;
use crate::surface::constants::{DEFAULT_VIEWPORT_HEIGHT_PX, DEFAULT_VIEWPORT_WIDTH_PX};
use crate::surface::geometry::{Point, Viewport};
use crate::surface::session::Session;

pub mod config;
pub mod constants;
pub mod errors;
pub mod fader_map;
pub mod floor_plan;
pub mod geometry;
pub mod gesture;
pub mod panning;
pub mod selection;
pub mod session;
pub mod sink;
pub mod throttle;

/// ControlSurface drives one operator screen of the speaker deck.
#[pyclass]
pub struct ControlSurface {
    session: Mutex<Session>,
}

impl ControlSurface {
    fn session(&self) -> PyResult<MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|_| PyRuntimeError::new_err("Failed to acquire session lock"))
    }
}

#[pymethods]
impl ControlSurface {
    /// Create a surface for a `width` x `height` px floor-plan viewport.
    ///
    /// Without `config_path` the built-in main-hall deck is used.
    #[new]
    #[pyo3(signature = (width=DEFAULT_VIEWPORT_WIDTH_PX, height=DEFAULT_VIEWPORT_HEIGHT_PX, config_path=None))]
    pub fn new(width: f64, height: f64, config_path: Option<String>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => SurfaceConfig::from_path(Path::new(&path)).map_err(|e| {
                PyValueError::new_err(format!("Failed to load configuration from {path}: {e}"))
            })?,
            None => SurfaceConfig::default(),
        };

        let session = Session::new(config, Viewport::new(width, height))
            .map_err(|e| PyValueError::new_err(format!("Failed to create control surface: {e}")))?;

        Ok(ControlSurface {
            session: Mutex::new(session),
        })
    }

    /// Take the receiving end of the outbound message ring.
    ///
    /// Only one outlet exists per surface; a second call fails.
    pub fn take_outlet(&self) -> PyResult<MessageOutlet> {
        let consumer = self
            .session()?
            .take_outlet()
            .ok_or_else(|| PyRuntimeError::new_err("Message outlet already taken"))?;

        Ok(MessageOutlet {
            consumer: Mutex::new(consumer),
        })
    }

    /// Feed one raw touch event (`phase` is one of start, move, end, cancel).
    pub fn touch(&self, phase: &str, x: f64, y: f64) -> PyResult<()> {
        let phase = TouchPhase::from_name(phase)
            .ok_or_else(|| PyValueError::new_err(format!("unknown touch phase: {phase}")))?;

        self.session()?
            .handle_touch(TouchEvent::new(phase, x, y), Instant::now());
        Ok(())
    }

    /// Re-fit the floor plan into a resized viewport.
    pub fn set_viewport(&self, width: f64, height: f64) -> PyResult<()> {
        self.session()?
            .set_viewport(Viewport::new(width, height))
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Switch between the floor-plan screen and the sound-movement screen.
    pub fn set_source_mode(&self, enabled: bool) -> PyResult<()> {
        self.session()?.set_source_mode(enabled, Instant::now());
        Ok(())
    }

    /// Send throttled values that are due. Call once per UI frame.
    pub fn tick(&self) -> PyResult<()> {
        self.session()?.tick(Instant::now());
        Ok(())
    }

    pub fn press(&self, id: &str) -> PyResult<bool> {
        Ok(self.session()?.press_speaker(id))
    }

    /// Ids the level panel should open for, or `None` if `id` is not selected.
    pub fn long_press(&self, id: &str) -> PyResult<Option<Vec<String>>> {
        Ok(self.session()?.long_press_speaker(id))
    }

    pub fn select_all(&self) -> PyResult<()> {
        self.session()?.select_all();
        Ok(())
    }

    pub fn clear_selection(&self) -> PyResult<()> {
        self.session()?.clear_selection();
        Ok(())
    }

    pub fn selected(&self) -> PyResult<Vec<String>> {
        Ok(self.session()?.selection())
    }

    pub fn muted(&self) -> PyResult<Vec<String>> {
        Ok(self.session()?.muted())
    }

    pub fn is_majority_muted(&self) -> PyResult<bool> {
        Ok(self.session()?.is_majority_muted())
    }

    pub fn toggle_mute(&self) -> PyResult<()> {
        self.session()?.toggle_mute();
        Ok(())
    }

    /// Move the level slider of the current selection.
    pub fn set_level(&self, level: f64) -> PyResult<()> {
        if !(0.0..=1.0).contains(&level) {
            return Err(PyValueError::new_err("level out of range"));
        }
        self.session()?.set_selection_level(level, Instant::now());
        Ok(())
    }

    /// The level slider was released.
    pub fn release_level(&self) -> PyResult<()> {
        self.session()?.release_selection_level(Instant::now());
        Ok(())
    }

    pub fn floor_plan_index(&self) -> PyResult<usize> {
        Ok(self.session()?.floor_plan_index())
    }

    pub fn floor_plan_label(&self) -> PyResult<String> {
        Ok(self.session()?.floor_plan().label.clone())
    }

    pub fn floor_plan_count(&self) -> PyResult<usize> {
        Ok(self.session()?.floor_plans().len())
    }

    pub fn set_floor_plan(&self, index: usize) -> PyResult<()> {
        let count = self.floor_plan_count()?;
        if !self.session()?.set_floor_plan(index) {
            return Err(PyValueError::new_err(format!(
                "floor plan out of range (expected 0..{}, got {index})",
                count.saturating_sub(1)
            )));
        }
        Ok(())
    }

    /// Screen position of every speaker on the current floor plan as `(id, x, y, type)`.
    pub fn speaker_positions(&self) -> PyResult<Vec<(String, f64, f64, &'static str)>> {
        let session = self.session()?;
        let positions = session
            .floor_plan()
            .speakers
            .iter()
            .map(|sp| {
                let p = session.hall_to_screen(sp.position());
                (sp.id.clone(), p.x, p.y, sp.kind.label())
            })
            .collect();
        Ok(positions)
    }

    /// Hall outline as `(x, y, width, height)` in pixels.
    pub fn hall_rect(&self) -> PyResult<(f64, f64, f64, f64)> {
        let r = self.session()?.hall_rect();
        Ok((r.x, r.y, r.width, r.height))
    }

    /// Rubber band of the drag in progress as `(x, y, width, height)`.
    pub fn selection_rect(&self) -> PyResult<Option<(f64, f64, f64, f64)>> {
        let rect = self.session()?.selection_rect();
        Ok(rect.map(|r| (r.x, r.y, r.width, r.height)))
    }

    /// Last observed source position in venue meters.
    pub fn source_position(&self) -> PyResult<Option<(f64, f64)>> {
        Ok(self.session()?.source_position().map(|p| (p.x, p.y)))
    }

    pub fn source_gains(&self) -> PyResult<Vec<(String, f64)>> {
        Ok(self.session()?.source_gains())
    }

    pub fn hall_to_screen(&self, x: f64, y: f64) -> PyResult<(f64, f64)> {
        let p = self.session()?.hall_to_screen(Point::new(x, y));
        Ok((p.x, p.y))
    }

    pub fn screen_to_hall(&self, x: f64, y: f64) -> PyResult<(f64, f64)> {
        let p = self.session()?.screen_to_hall(Point::new(x, y));
        Ok((p.x, p.y))
    }
}

/// Receiving end of the control-message ring, drained by the socket transport.
#[pyclass]
pub struct MessageOutlet {
    consumer: Mutex<Consumer<ControlMessage>>,
}

impl MessageOutlet {
    fn pop(&self) -> PyResult<Option<ControlMessage>> {
        let mut consumer_guard = self
            .consumer
            .lock()
            .map_err(|_| PyRuntimeError::new_err("Failed to acquire consumer lock"))?;

        match consumer_guard.pop() {
            Ok(msg) => Ok(Some(msg)),
            Err(_) => Ok(None),
        }
    }
}

#[pymethods]
impl MessageOutlet {
    /// Poll the next control message as a dict with an `event` key and its fields.
    ///
    /// Returns `None` when no messages are pending.
    pub fn poll(&self, py: Python<'_>) -> PyResult<Option<Py<PyAny>>> {
        let Some(msg) = self.pop()? else {
            return Ok(None);
        };

        let dict = PyDict::new(py);
        dict.set_item("event", msg.event_name())?;
        match msg {
            ControlMessage::UpdateFader { channel, value } => {
                dict.set_item("channel", channel)?;
                dict.set_item("value", value)?;
            }
            ControlMessage::UpdateSource { x, y } => {
                dict.set_item("x", x)?;
                dict.set_item("y", y)?;
            }
            ControlMessage::UpdateMute { channel, mute } => {
                dict.set_item("channel", channel)?;
                dict.set_item("mute", mute)?;
            }
        }

        Ok(Some(dict.into_any().unbind()))
    }

    /// Poll the next control message encoded as `{"event": ..., "data": {...}}`.
    pub fn poll_json(&self) -> PyResult<Option<String>> {
        let Some(msg) = self.pop()? else {
            return Ok(None);
        };

        msg.to_json()
            .map(Some)
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to encode message: {e}")))
    }

    /// Number of messages waiting to be polled.
    pub fn __len__(&self) -> PyResult<usize> {
        let consumer_guard = self
            .consumer
            .lock()
            .map_err(|_| PyRuntimeError::new_err("Failed to acquire consumer lock"))?;
        Ok(consumer_guard.slots())
    }
}
