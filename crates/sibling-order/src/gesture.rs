//! Drag Gesture Controller
//!
//! Turns raw pointer and keyboard input from one draggable region into
//! discrete reorder intents.
//!
//! # State Machine
//!
//! `Idle → Armed → Dragging → {Committed, Cancelled} → Idle`
//!
//! - A pointer press only arms the controller. It starts dragging once the
//!   pointer travels further than the activation distance, so an ordinary
//!   click never becomes a zero-length drag.
//! - A keyboard pick-up enters `Dragging` directly.
//! - While dragging, candidate positions produce `Preview` sequences for live
//!   feedback. Nothing is persisted until a drop commits.
//! - Escape, or a release outside any valid target, restores the exact
//!   pre-drag sequence.

use log::debug;

use crate::config::ReorderConfig;
use crate::item::{ItemId, Sibling};
use crate::model::OrderedCollection;

/// Discrete keyboard commands for non-pointer reordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKey {
    /// Grab the focused item
    PickUp(ItemId),
    Up,
    Down,
    Home,
    End,
    Drop,
    Cancel,
}

/// Raw input routed to the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureInput {
    PointerDown { item_id: ItemId, x: f64, y: f64 },
    /// `over_index` is the nearest sibling slot under the pointer, if any
    PointerMove { x: f64, y: f64, over_index: Option<usize> },
    /// `over_index` is `None` when released outside a valid target
    PointerUp { over_index: Option<usize> },
    Key(GestureKey),
}

/// Observable phase, for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    Armed,
    Dragging,
}

/// Output of one input event
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent<T: Sibling> {
    /// Dragging began for `item_id` at `origin_index`
    Started { item_id: ItemId, origin_index: usize },
    /// Live feedback sequence; not to be persisted
    Preview(OrderedCollection<T>),
    /// Dropped at a new index; `sequence` is the final order to commit
    Committed {
        item_id: ItemId,
        from_index: usize,
        to_index: usize,
        sequence: OrderedCollection<T>,
    },
    /// Gesture ended without effect; `restore` is the pre-drag sequence
    Cancelled { restore: OrderedCollection<T> },
}

#[derive(Debug, Clone)]
struct DragSession<T: Sibling> {
    item_id: ItemId,
    origin_index: usize,
    current_index: usize,
    original: OrderedCollection<T>,
    preview: OrderedCollection<T>,
    via_keyboard: bool,
}

#[derive(Debug, Clone)]
enum GestureState<T: Sibling> {
    Idle,
    Armed { item_id: ItemId, start_x: f64, start_y: f64 },
    Dragging(DragSession<T>),
}

/// Per-region gesture state machine
#[derive(Debug, Clone)]
pub struct DragGestureController<T: Sibling> {
    activation_distance: f64,
    state: GestureState<T>,
}

impl<T: Sibling> DragGestureController<T> {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            activation_distance: activation_distance.max(0.0),
            state: GestureState::Idle,
        }
    }

    pub fn from_config(config: &ReorderConfig) -> Self {
        Self::new(config.activation_distance_px)
    }

    pub fn phase(&self) -> GesturePhase {
        match self.state {
            GestureState::Idle => GesturePhase::Idle,
            GestureState::Armed { .. } => GesturePhase::Armed,
            GestureState::Dragging(_) => GesturePhase::Dragging,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging(_))
    }

    /// Item currently being dragged
    pub fn dragging_item(&self) -> Option<ItemId> {
        match &self.state {
            GestureState::Dragging(session) => Some(session.item_id),
            _ => None,
        }
    }

    /// Live sequence while dragging
    pub fn preview(&self) -> Option<&OrderedCollection<T>> {
        match &self.state {
            GestureState::Dragging(session) => Some(&session.preview),
            _ => None,
        }
    }

    /// Drop any gesture silently (e.g. on focus loss or a reload).
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Feed one input event. `current` is the sequence on screen and is only
    /// read when a drag starts.
    pub fn handle(&mut self, input: GestureInput, current: &OrderedCollection<T>) -> Option<GestureEvent<T>> {
        match input {
            GestureInput::PointerDown { item_id, x, y } => {
                if matches!(self.state, GestureState::Idle) && current.position_of(item_id).is_some() {
                    self.state = GestureState::Armed { item_id, start_x: x, start_y: y };
                }
                None
            }
            GestureInput::PointerMove { x, y, over_index } => self.on_pointer_move(x, y, over_index, current),
            GestureInput::PointerUp { over_index } => self.on_pointer_up(over_index),
            GestureInput::Key(key) => self.on_key(key, current),
        }
    }

    fn on_pointer_move(
        &mut self,
        x: f64,
        y: f64,
        over_index: Option<usize>,
        current: &OrderedCollection<T>,
    ) -> Option<GestureEvent<T>> {
        if let GestureState::Armed { item_id, start_x, start_y } = self.state {
            let dx = x - start_x;
            let dy = y - start_y;
            if (dx * dx + dy * dy).sqrt() <= self.activation_distance {
                return None;
            }
            let started = self.start(item_id, current, false)?;
            // The move that crossed the threshold may already point somewhere
            if let Some(index) = over_index {
                if let Some(preview) = self.retarget(index) {
                    return Some(preview);
                }
            }
            return Some(started);
        }

        let via_keyboard = match &self.state {
            GestureState::Dragging(session) => session.via_keyboard,
            _ => return None,
        };
        if via_keyboard {
            return None;
        }
        over_index.and_then(|index| self.retarget(index))
    }

    fn on_pointer_up(&mut self, over_index: Option<usize>) -> Option<GestureEvent<T>> {
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            // Released before the threshold: a plain click
            GestureState::Idle | GestureState::Armed { .. } => None,
            GestureState::Dragging(session) if session.via_keyboard => {
                self.state = GestureState::Dragging(session);
                None
            }
            GestureState::Dragging(session) => match over_index {
                None => {
                    debug!("drag of {} released outside the list", session.item_id);
                    Some(GestureEvent::Cancelled { restore: session.original })
                }
                Some(index) => Self::finish(session, index),
            },
        }
    }

    fn on_key(&mut self, key: GestureKey, current: &OrderedCollection<T>) -> Option<GestureEvent<T>> {
        match key {
            GestureKey::PickUp(item_id) => {
                if self.is_dragging() {
                    return None;
                }
                self.start(item_id, current, true)
            }
            GestureKey::Cancel => match std::mem::replace(&mut self.state, GestureState::Idle) {
                GestureState::Dragging(session) => {
                    debug!("drag of {} cancelled", session.item_id);
                    Some(GestureEvent::Cancelled { restore: session.original })
                }
                _ => None,
            },
            GestureKey::Drop => match std::mem::replace(&mut self.state, GestureState::Idle) {
                GestureState::Dragging(session) => {
                    let index = session.current_index;
                    Self::finish(session, index)
                }
                other => {
                    self.state = other;
                    None
                }
            },
            GestureKey::Up | GestureKey::Down | GestureKey::Home | GestureKey::End => {
                let (current_index, len) = match &self.state {
                    GestureState::Dragging(session) => (session.current_index, session.preview.len()),
                    _ => return None,
                };
                let last = len.saturating_sub(1);
                let target = match key {
                    GestureKey::Up => current_index.saturating_sub(1),
                    GestureKey::Down => (current_index + 1).min(last),
                    GestureKey::Home => 0,
                    _ => last,
                };
                self.retarget(target)
            }
        }
    }

    fn start(&mut self, item_id: ItemId, current: &OrderedCollection<T>, via_keyboard: bool) -> Option<GestureEvent<T>> {
        let Some(origin_index) = current.position_of(item_id) else {
            self.state = GestureState::Idle;
            return None;
        };
        debug!("drag of {} started at {} (keyboard: {})", item_id, origin_index, via_keyboard);
        self.state = GestureState::Dragging(DragSession {
            item_id,
            origin_index,
            current_index: origin_index,
            original: current.clone(),
            preview: current.clone(),
            via_keyboard,
        });
        Some(GestureEvent::Started { item_id, origin_index })
    }

    fn retarget(&mut self, index: usize) -> Option<GestureEvent<T>> {
        let GestureState::Dragging(session) = &mut self.state else {
            return None;
        };
        let index = index.min(session.original.len().saturating_sub(1));
        if index == session.current_index {
            return None;
        }
        let preview = session.original.moved(session.item_id, index).ok()?;
        session.current_index = index;
        session.preview = preview.clone();
        Some(GestureEvent::Preview(preview))
    }

    fn finish(session: DragSession<T>, index: usize) -> Option<GestureEvent<T>> {
        let to_index = index.min(session.original.len().saturating_sub(1));
        if to_index == session.origin_index {
            return Some(GestureEvent::Cancelled { restore: session.original });
        }
        let sequence = session.original.moved(session.item_id, to_index).ok()?;
        debug!("drag of {} committed {} -> {}", session.item_id, session.origin_index, to_index);
        Some(GestureEvent::Committed {
            item_id: session.item_id,
            from_index: session.origin_index,
            to_index,
            sequence,
        })
    }
}

/// Index of the row whose vertical centre is nearest to `pointer_y`.
///
/// `row_bounds` holds `(top, bottom)` per row in display order.
pub fn nearest_index(pointer_y: f64, row_bounds: &[(f64, f64)]) -> Option<usize> {
    row_bounds
        .iter()
        .enumerate()
        .map(|(index, (top, bottom))| (index, ((top + bottom) / 2.0 - pointer_y).abs()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}
