//! The control session behind one operator screen.
//!
//! [`Session`] owns the floor-plan deck, the cursor into it, the coordinate mapping, the
//! selection and mute state, the gesture router and both throttled streams. Every touch is
//! routed against the geometry the session holds at that moment; the resulting control
//! messages go straight to the [`MessageSink`].

use rtrb::Consumer;
use std::time::Instant;

use crate::messages::{ControlMessage, TouchEvent};
use crate::surface::config::SurfaceConfig;
use crate::surface::errors::{GeometryError, SurfaceError};
use crate::surface::fader_map::FaderMapping;
use crate::surface::floor_plan::FloorPlan;
use crate::surface::geometry::{CoordinateMapper, Point, ScreenRect, Viewport};
use crate::surface::gesture::{
    Classification, GestureAction, GestureRouter, GestureSettings, PageDirection, RouterMode,
};
use crate::surface::panning::{distance, speaker_gains, volume_to_fader_value};
use crate::surface::selection::SelectionEngine;
use crate::surface::sink::{MessageSink, outbound_channel, setup_logger};
use crate::surface::throttle::{StreamKey, ThrottlePolicy, ThrottledEmitter};

pub struct Session {
    config: SurfaceConfig,
    plan_index: usize,
    viewport: Viewport,
    mapper: CoordinateMapper,
    fader_map: FaderMapping,
    selection: SelectionEngine,
    router: GestureRouter,
    source_emitter: ThrottledEmitter<StreamKey, Point>,
    fader_emitter: ThrottledEmitter<StreamKey, u16>,
    source_position: Option<Point>,
    sink: Box<dyn MessageSink>,
    outlet: Option<Consumer<ControlMessage>>,
}

impl Session {
    /// Builds a session that sends into a fresh outbound ring.
    ///
    /// The consumer half is handed out once through [`take_outlet`](Self::take_outlet).
    pub fn new(config: SurfaceConfig, viewport: Viewport) -> Result<Self, SurfaceError> {
        let (producer, consumer) = outbound_channel(config.outbound_capacity);
        let mut session = Self::with_sink(config, viewport, Box::new(producer))?;
        session.outlet = Some(consumer);
        Ok(session)
    }

    /// Builds a session that sends through a caller-provided sink.
    pub fn with_sink(
        config: SurfaceConfig,
        viewport: Viewport,
        sink: Box<dyn MessageSink>,
    ) -> Result<Self, SurfaceError> {
        setup_logger();
        config.validate()?;

        let mapper = CoordinateMapper::new(
            config.hall.width,
            config.hall.height,
            viewport,
            config.margin_ratio,
        )?;

        let source_policy = ThrottlePolicy {
            min_interval: config.source_interval(),
            min_delta: config.source_min_delta_m,
        };
        let fader_policy = ThrottlePolicy {
            min_interval: config.fader_interval(),
            min_delta: config.fader_min_delta,
        };

        let router = GestureRouter::new(GestureSettings {
            paging_band_ratio: config.paging_band_ratio,
            swipe_threshold_px: config.swipe_threshold_px,
            tap_slop_px: config.tap_slop_px,
        });

        log::info!(
            "Control surface ready: {} floor plans, hall {:.1} x {:.1} m, viewport {:.0} x {:.0} px",
            config.floor_plans.len(),
            config.hall.width,
            config.hall.height,
            viewport.width,
            viewport.height
        );

        Ok(Self {
            fader_map: config.fader_mapping(),
            config,
            plan_index: 0,
            viewport,
            mapper,
            selection: SelectionEngine::new(),
            router,
            source_emitter: ThrottledEmitter::new(source_policy),
            fader_emitter: ThrottledEmitter::new(fader_policy),
            source_position: None,
            sink,
            outlet: None,
        })
    }

    /// Hands out the consumer end of the outbound ring. Only the first call gets it.
    pub fn take_outlet(&mut self) -> Option<Consumer<ControlMessage>> {
        self.outlet.take()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Re-fits the hall into a new viewport. On error the previous layout is kept.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), GeometryError> {
        self.mapper = CoordinateMapper::new(
            self.config.hall.width,
            self.config.hall.height,
            viewport,
            self.config.margin_ratio,
        )?;
        self.viewport = viewport;
        log::debug!(
            "Viewport changed to {:.0} x {:.0} px (scale {:.3} px/m)",
            viewport.width,
            viewport.height,
            self.mapper.scale()
        );
        Ok(())
    }

    // ----- gestures -----

    /// Routes one raw touch event and applies whatever it resolves to.
    pub fn handle_touch(&mut self, event: TouchEvent, now: Instant) {
        let actions = self.router.handle(event, self.viewport);
        for action in actions {
            self.apply(action, now);
        }
    }

    /// Switches between the floor-plan screen and the sound-movement screen.
    pub fn set_source_mode(&mut self, enabled: bool, now: Instant) {
        let mode = if enabled {
            RouterMode::SourceDrag
        } else {
            RouterMode::FloorPlan
        };
        for action in self.router.set_mode(mode) {
            self.apply(action, now);
        }
    }

    pub fn router_mode(&self) -> RouterMode {
        self.router.mode()
    }

    pub fn classification(&self) -> Classification {
        self.router.classification()
    }

    fn apply(&mut self, action: GestureAction, now: Instant) {
        match action {
            GestureAction::SelectRect(rect) => {
                let mapper = &self.mapper;
                let plan = &self.config.floor_plans[self.plan_index];
                self.selection.set_from_rect(
                    rect,
                    plan.speakers
                        .iter()
                        .map(|sp| (sp.id.as_str(), mapper.hall_to_screen(sp.position()))),
                );
            }
            GestureAction::Tap(p) => match self.hit_test(p).map(str::to_string) {
                Some(id) => self.selection.toggle_press(&id),
                None => self.selection.clear(),
            },
            GestureAction::MoveSource(p) => self.move_source(p, now),
            GestureAction::ReleaseSource => {
                if let Some(p) = self.source_emitter.flush(&StreamKey::Source, now) {
                    self.send(ControlMessage::UpdateSource { x: p.x, y: p.y });
                }
            }
            GestureAction::Page(direction) => self.page(direction),
        }
    }

    /// The speaker whose screen position is nearest to `p`, within the hit radius.
    fn hit_test(&self, p: Point) -> Option<&str> {
        let radius = self.config.speaker_hit_radius_px;
        self.speaker_screen_positions()
            .into_iter()
            .map(|(id, center)| (id, distance(center, p)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    fn move_source(&mut self, screen: Point, now: Instant) {
        let hall = self.mapper.clamp_to_hall(self.mapper.screen_to_hall(screen));
        self.source_position = Some(hall);

        if let Some(p) = self.source_emitter.offer(StreamKey::Source, hall, now) {
            self.send(ControlMessage::UpdateSource { x: p.x, y: p.y });
        }
    }

    // ----- floor plans -----

    pub fn floor_plans(&self) -> &[FloorPlan] {
        &self.config.floor_plans
    }

    pub fn floor_plan_index(&self) -> usize {
        self.plan_index
    }

    pub fn floor_plan(&self) -> &FloorPlan {
        &self.config.floor_plans[self.plan_index]
    }

    /// Jumps to floor plan `index`; out-of-range requests are ignored.
    pub fn set_floor_plan(&mut self, index: usize) -> bool {
        let count = self.config.floor_plans.len();
        if index >= count {
            log::warn!("Floor plan {index} does not exist (deck has {count})");
            return false;
        }
        if index != self.plan_index {
            self.plan_index = index;
            self.selection.switch_plan(index);
            log::info!(
                "Switched to floor plan {} ({})",
                index,
                self.config.floor_plans[index].label
            );
        }
        true
    }

    fn page(&mut self, direction: PageDirection) {
        let last = self.config.floor_plans.len().saturating_sub(1);
        let target = match direction {
            PageDirection::Next => (self.plan_index + 1).min(last),
            PageDirection::Previous => self.plan_index.saturating_sub(1),
        };
        self.set_floor_plan(target);
    }

    // ----- selection & mute -----

    /// Applies a tap to speaker `id` of the current floor plan.
    pub fn press_speaker(&mut self, id: &str) -> bool {
        if !self.floor_plan().contains(id) {
            log::warn!("Unknown speaker id on floor plan {}: {id}", self.plan_index);
            return false;
        }
        self.selection.toggle_press(id);
        true
    }

    /// The speakers the level panel should open for, if `id` is part of the selection.
    pub fn long_press_speaker(&self, id: &str) -> Option<Vec<String>> {
        self.selection.long_press(id)
    }

    pub fn select_all(&mut self) {
        let plan = &self.config.floor_plans[self.plan_index];
        self.selection.select_all(plan.ids());
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selected ids of the current floor plan, sorted.
    pub fn selection(&self) -> Vec<String> {
        self.selection.current().iter().cloned().collect()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.is_selected(id)
    }

    /// Muted ids across every floor plan, sorted.
    pub fn muted(&self) -> Vec<String> {
        self.selection.muted().iter().cloned().collect()
    }

    pub fn is_muted(&self, id: &str) -> bool {
        self.selection.is_muted(id)
    }

    pub fn is_majority_muted(&self) -> bool {
        self.selection.is_majority_muted()
    }

    /// Toggles mute on the selection and sends one mute update per mapped speaker.
    pub fn toggle_mute(&mut self) {
        for (id, mute) in self.selection.apply_mute_toggle() {
            if let Some(channel) = self.fader_map.resolve_or_warn(&id) {
                self.send(ControlMessage::UpdateMute { channel, mute });
            }
        }
    }

    /// Moves the level slider of the selection to `level` (0..1).
    ///
    /// Each mapped channel is its own throttled stream; unmapped speakers are skipped.
    pub fn set_selection_level(&mut self, level: f64, now: Instant) {
        let value = volume_to_fader_value(level);
        let channels: Vec<u32> = self
            .fader_map
            .resolve_all(self.selection.current().iter().map(String::as_str))
            .into_iter()
            .map(|(_, channel)| channel)
            .collect();

        for channel in channels {
            if let Some(value) = self.fader_emitter.offer(StreamKey::Fader(channel), value, now) {
                self.send(ControlMessage::UpdateFader { channel, value });
            }
        }
    }

    /// The slider was let go: every held fader value goes out now.
    pub fn release_selection_level(&mut self, now: Instant) {
        for (key, value) in self.fader_emitter.flush_all(now) {
            if let StreamKey::Fader(channel) = key {
                self.send(ControlMessage::UpdateFader { channel, value });
            }
        }
    }

    /// Sends held values whose interval has run out. Called from the host's frame loop.
    pub fn tick(&mut self, now: Instant) {
        let due = self.source_emitter.poll_due(now);
        for (_, p) in due {
            self.send(ControlMessage::UpdateSource { x: p.x, y: p.y });
        }

        let due = self.fader_emitter.poll_due(now);
        for (key, value) in due {
            if let StreamKey::Fader(channel) = key {
                self.send(ControlMessage::UpdateFader { channel, value });
            }
        }
    }

    // ----- rendering queries -----

    /// Last observed source position in hall meters.
    pub fn source_position(&self) -> Option<Point> {
        self.source_position
    }

    /// Distance-panning gain of every speaker on the current floor plan for the last
    /// observed source position. Empty until the source has been moved.
    pub fn source_gains(&self) -> Vec<(String, f64)> {
        let Some(source) = self.source_position else {
            return Vec::new();
        };
        speaker_gains(
            source,
            &self.floor_plan().speakers,
            self.config.max_pan_distance(),
        )
        .into_iter()
        .map(|(id, gain)| (id.to_string(), gain))
        .collect()
    }

    pub fn speaker_screen_positions(&self) -> Vec<(&str, Point)> {
        self.floor_plan()
            .speakers
            .iter()
            .map(|sp| (sp.id.as_str(), self.mapper.hall_to_screen(sp.position())))
            .collect()
    }

    pub fn hall_rect(&self) -> ScreenRect {
        self.mapper.hall_rect()
    }

    pub fn selection_rect(&self) -> Option<ScreenRect> {
        self.router.selection_rect()
    }

    pub fn hall_to_screen(&self, p: Point) -> Point {
        self.mapper.hall_to_screen(p)
    }

    pub fn screen_to_hall(&self, p: Point) -> Point {
        self.mapper.screen_to_hall(p)
    }

    fn send(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::UpdateFader { channel, value } => {
                log::debug!("Sending fader update => channel: {channel}, value: {value}");
            }
            ControlMessage::UpdateSource { x, y } => {
                log::debug!("Sending source position => x: {x:.2}, y: {y:.2}");
            }
            ControlMessage::UpdateMute { channel, mute } => {
                log::debug!("Sending mute update => channel: {channel}, mute: {mute}");
            }
        }
        self.sink.send(message);
    }
}
