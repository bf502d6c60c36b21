//! Gesture classification and routing.
//!
//! A touch is classified exactly once, when it starts, from where it starts. Every later
//! move, release or cancel of that touch goes to the same handler. The router only tracks
//! per-gesture state and reports [`GestureAction`]s; the surface applies them against the
//! current floor plan and geometry at the time of the event.

use crate::messages::{TouchEvent, TouchPhase};
use crate::surface::geometry::{Point, ScreenRect, Viewport};
use crate::surface::panning::distance;

/// Which screen the router is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouterMode {
    /// Floor plan with selection and paging.
    #[default]
    FloorPlan,
    /// Sound-movement screen: every touch drags the virtual source.
    SourceDrag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Unclassified,
    RectSelect,
    Paging,
    SourceDrag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Next,
    Previous,
}

/// What the surface must do in response to a touch event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    /// Recompute the selection from this screen-space rectangle.
    SelectRect(ScreenRect),
    /// A touch that never moved beyond the tap slop was released here.
    Tap(Point),
    /// The virtual source was dragged to this screen position.
    MoveSource(Point),
    /// The source drag ended; flush the final position.
    ReleaseSource,
    /// Step the floor-plan cursor.
    Page(PageDirection),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSettings {
    /// Bottom fraction of the viewport height that starts a paging swipe.
    pub paging_band_ratio: f64,
    pub swipe_threshold_px: f64,
    pub tap_slop_px: f64,
}

/// State of the touch currently in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    pub origin: Point,
    pub classification: Classification,
    last: Point,
    dragging: bool,
}

#[derive(Debug)]
pub struct GestureRouter {
    settings: GestureSettings,
    mode: RouterMode,
    session: Option<GestureSession>,
    selection_rect: Option<ScreenRect>,
    page_dx: f64,
}

impl GestureRouter {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            settings,
            mode: RouterMode::default(),
            session: None,
            selection_rect: None,
            page_dx: 0.0,
        }
    }

    pub fn mode(&self) -> RouterMode {
        self.mode
    }

    /// Switches screens. A gesture in progress is cancelled first.
    pub fn set_mode(&mut self, mode: RouterMode) -> Vec<GestureAction> {
        if mode == self.mode {
            return Vec::new();
        }
        let actions = self.cancel();
        self.mode = mode;
        actions
    }

    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    pub fn classification(&self) -> Classification {
        self.session
            .map_or(Classification::Unclassified, |s| s.classification)
    }

    /// The rubber band, present only while a rect-select drag is in progress.
    pub fn selection_rect(&self) -> Option<ScreenRect> {
        self.selection_rect
    }

    /// Net horizontal displacement of the paging swipe in progress.
    pub fn page_delta(&self) -> f64 {
        self.page_dx
    }

    /// Routes one raw touch event.
    ///
    /// `viewport` is read at event time so classification always uses the current layout.
    pub fn handle(&mut self, event: TouchEvent, viewport: Viewport) -> Vec<GestureAction> {
        let p = Point::new(event.x, event.y);
        match event.phase {
            TouchPhase::Start => self.start(p, viewport),
            TouchPhase::Move => self.move_to(p).into_iter().collect(),
            TouchPhase::End => self.release(p),
            TouchPhase::Cancel => self.cancel(),
        }
    }

    fn classify(&self, origin: Point, viewport: Viewport) -> Classification {
        if self.mode == RouterMode::SourceDrag {
            return Classification::SourceDrag;
        }

        let band_top = viewport.height * (1.0 - self.settings.paging_band_ratio);
        if origin.y >= band_top {
            Classification::Paging
        } else {
            Classification::RectSelect
        }
    }

    fn start(&mut self, origin: Point, viewport: Viewport) -> Vec<GestureAction> {
        // A start without a release for the previous touch: drop the stale one.
        let mut actions = if self.session.is_some() {
            log::debug!("Touch started while a gesture was active; cancelling it");
            self.cancel()
        } else {
            Vec::new()
        };

        let classification = self.classify(origin, viewport);
        log::trace!(
            "Gesture at ({:.1}, {:.1}) classified as {classification:?}",
            origin.x,
            origin.y
        );

        self.session = Some(GestureSession {
            origin,
            classification,
            last: origin,
            dragging: false,
        });
        self.selection_rect = None;
        self.page_dx = 0.0;

        if classification == Classification::SourceDrag {
            actions.push(GestureAction::MoveSource(origin));
        }
        actions
    }

    fn move_to(&mut self, p: Point) -> Option<GestureAction> {
        let tap_slop = self.settings.tap_slop_px;
        let session = self.session.as_mut()?;
        session.last = p;

        match session.classification {
            Classification::RectSelect => {
                if !session.dragging && distance(session.origin, p) > tap_slop {
                    session.dragging = true;
                }
                if !session.dragging {
                    return None;
                }
                let rect = ScreenRect::from_corners(session.origin, p);
                self.selection_rect = Some(rect);
                Some(GestureAction::SelectRect(rect))
            }
            Classification::Paging => {
                if distance(session.origin, p) > tap_slop {
                    session.dragging = true;
                }
                self.page_dx = p.x - session.origin.x;
                None
            }
            Classification::SourceDrag => Some(GestureAction::MoveSource(p)),
            Classification::Unclassified => None,
        }
    }

    fn release(&mut self, p: Point) -> Vec<GestureAction> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        self.selection_rect = None;

        let actions = match session.classification {
            Classification::RectSelect => {
                let moved = distance(session.origin, p) > self.settings.tap_slop_px;
                if session.dragging {
                    Vec::new()
                } else if moved {
                    // Released beyond the slop without any move in between.
                    vec![GestureAction::SelectRect(ScreenRect::from_corners(
                        session.origin,
                        p,
                    ))]
                } else {
                    vec![GestureAction::Tap(session.origin)]
                }
            }
            Classification::Paging => {
                let dx = p.x - session.origin.x;
                let threshold = self.settings.swipe_threshold_px;
                let stationary = distance(session.origin, p) <= self.settings.tap_slop_px;
                if !session.dragging && stationary {
                    // Speakers can sit inside the paging band; a stationary touch there is a tap.
                    vec![GestureAction::Tap(session.origin)]
                } else if dx < -threshold {
                    vec![GestureAction::Page(PageDirection::Next)]
                } else if dx > threshold {
                    vec![GestureAction::Page(PageDirection::Previous)]
                } else {
                    Vec::new()
                }
            }
            Classification::SourceDrag => {
                let mut actions = Vec::with_capacity(2);
                if p != session.last {
                    actions.push(GestureAction::MoveSource(p));
                }
                actions.push(GestureAction::ReleaseSource);
                actions
            }
            Classification::Unclassified => Vec::new(),
        };

        self.page_dx = 0.0;
        actions
    }

    /// Platform-terminated gesture: same transient cleanup as a release, never a page step
    /// or a tap.
    fn cancel(&mut self) -> Vec<GestureAction> {
        let session = self.session.take();
        self.selection_rect = None;
        self.page_dx = 0.0;

        match session.map(|s| s.classification) {
            Some(Classification::SourceDrag) => vec![GestureAction::ReleaseSource],
            _ => Vec::new(),
        }
    }
}
