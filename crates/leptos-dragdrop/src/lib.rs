//! Leptos DragDrop Utilities
//!
//! Routes mouse and keyboard input from one draggable list into a
//! `DragGestureController`. The controller decides click vs drag (movement
//! threshold), keeps the preview order and reports the finished sequence;
//! this crate only turns DOM events into gesture inputs and mirrors the
//! controller's state into signals for rendering.
//!
//! Rows of the region are the elements carrying `data-drag-row`, in visual
//! order.

use leptos::prelude::*;
use sibling_order::gesture::nearest_index;
use sibling_order::{
    DragGestureController, GestureEvent, GestureInput, GestureKey, GesturePhase, ItemId, OrderedCollection,
    ReorderConfig, Sibling,
};
use wasm_bindgen::JsCast;

/// Attribute marking a draggable row inside the region
pub const ROW_ATTRIBUTE: &str = "data-drag-row";

/// One draggable region: the gesture controller plus render signals.
pub struct DragRegion<T: Sibling + Send + Sync + 'static> {
    controller: StoredValue<DragGestureController<T>, LocalStorage>,
    pub phase: RwSignal<GesturePhase>,
    pub dragging_id: RwSignal<Option<ItemId>>,
    /// Order to show while dragging
    pub preview: RwSignal<Option<OrderedCollection<T>>>,
    /// True for a moment after a drop so the trailing click is ignored
    pub drag_just_ended: RwSignal<bool>,
}

impl<T: Sibling + Send + Sync + 'static> Clone for DragRegion<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Sibling + Send + Sync + 'static> Copy for DragRegion<T> {}

impl<T: Sibling + Send + Sync + 'static> DragRegion<T> {
    pub fn new(config: &ReorderConfig) -> Self {
        Self {
            controller: StoredValue::new_local(DragGestureController::from_config(config)),
            phase: RwSignal::new(GesturePhase::Idle),
            dragging_id: RwSignal::new(None),
            preview: RwSignal::new(None),
            drag_just_ended: RwSignal::new(false),
        }
    }

    /// Feed one input to the controller and refresh the signals.
    pub fn dispatch(&self, input: GestureInput, current: &OrderedCollection<T>) -> Option<GestureEvent<T>> {
        let event = self
            .controller
            .try_update_value(|controller| controller.handle(input, current))
            .flatten();
        self.sync();
        if matches!(event, Some(GestureEvent::Committed { .. }) | Some(GestureEvent::Cancelled { .. })) {
            mark_drag_ended(self.drag_just_ended);
        }
        event
    }

    /// Drop any gesture in progress, e.g. when the list is replaced.
    pub fn reset(&self) {
        self.controller.update_value(|controller| controller.reset());
        self.sync();
    }

    fn sync(&self) {
        self.controller.with_value(|controller| {
            self.phase.set(controller.phase());
            self.dragging_id.set(controller.dragging_item());
            self.preview.set(controller.preview().cloned());
        });
    }
}

fn mark_drag_ended(flag: RwSignal<bool>) {
    flag.set(true);
    if let Some(win) = web_sys::window() {
        let cb = wasm_bindgen::closure::Closure::<dyn FnMut()>::new(move || {
            flag.set(false);
        });
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), 100);
        cb.forget();
    }
}

/// `(top, bottom)` of every row under `container`, in document order
pub fn row_bounds(container: &web_sys::Element) -> Vec<(f64, f64)> {
    let Ok(rows) = container.query_selector_all(&format!("[{}]", ROW_ATTRIBUTE)) else {
        return Vec::new();
    };
    (0..rows.length())
        .filter_map(|i| rows.item(i))
        .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
        .map(|row| {
            let rect = row.get_bounding_client_rect();
            (rect.top(), rect.bottom())
        })
        .collect()
}

fn over_index(container: &NodeRef<leptos::html::Div>, pointer_y: f64) -> Option<usize> {
    let element = container.get_untracked()?;
    nearest_index(pointer_y, &row_bounds(&element))
}

/// Keyboard mapping for a focused row.
///
/// Space/Enter pick up or drop, arrows and Home/End move while carried,
/// Escape cancels. Anything else is left to the browser.
pub fn gesture_key_for(key: &str, carrying: bool, focused: ItemId) -> Option<GestureKey> {
    match (key, carrying) {
        (" " | "Enter", false) => Some(GestureKey::PickUp(focused)),
        (" " | "Enter", true) => Some(GestureKey::Drop),
        ("ArrowUp", true) => Some(GestureKey::Up),
        ("ArrowDown", true) => Some(GestureKey::Down),
        ("Home", true) => Some(GestureKey::Home),
        ("End", true) => Some(GestureKey::End),
        ("Escape", true) => Some(GestureKey::Cancel),
        _ => None,
    }
}

/// Create mousedown handler for a row's drag handle
pub fn make_on_mousedown<T>(
    region: DragRegion<T>,
    item_id: ItemId,
    current: Signal<OrderedCollection<T>>,
) -> impl Fn(web_sys::MouseEvent) + Copy + 'static
where
    T: Sibling + Send + Sync + 'static,
{
    move |ev: web_sys::MouseEvent| {
        if ev.button() != 0 {
            return;
        }
        // Ignore if target is input or button
        if let Some(target) = ev.target() {
            if target.dyn_ref::<web_sys::HtmlInputElement>().is_some() { return; }
            if target.dyn_ref::<web_sys::HtmlButtonElement>().is_some() { return; }
        }
        let input = GestureInput::PointerDown {
            item_id,
            x: ev.client_x() as f64,
            y: ev.client_y() as f64,
        };
        current.with_untracked(|current| region.dispatch(input, current));
    }
}

/// Create keydown handler for a focusable row
pub fn make_on_keydown<T, F>(
    region: DragRegion<T>,
    item_id: ItemId,
    current: Signal<OrderedCollection<T>>,
    on_commit: F,
) -> impl Fn(web_sys::KeyboardEvent) + Clone + 'static
where
    T: Sibling + Send + Sync + 'static,
    F: Fn(OrderedCollection<T>) + Clone + 'static,
{
    move |ev: web_sys::KeyboardEvent| {
        // Keys typed into controls inside the row stay with them
        if let Some(target) = ev.target() {
            if target.dyn_ref::<web_sys::HtmlInputElement>().is_some() { return; }
            if target.dyn_ref::<web_sys::HtmlButtonElement>().is_some() { return; }
        }
        let carrying = region.dragging_id.get_untracked().is_some();
        let Some(key) = gesture_key_for(&ev.key(), carrying, item_id) else {
            return;
        };
        ev.prevent_default();
        let event = current.with_untracked(|current| region.dispatch(GestureInput::Key(key), current));
        if let Some(GestureEvent::Committed { sequence, .. }) = event {
            on_commit(sequence);
        }
    }
}

/// Bind document-level mousemove/mouseup/keydown for the region.
///
/// Bind once per region; `on_commit` receives the sequence of every drop
/// that changed the order. Escape anywhere cancels a drag that a row
/// handler has not already handled.
pub fn bind_global_listeners<T, F>(
    region: DragRegion<T>,
    container: NodeRef<leptos::html::Div>,
    current: Signal<OrderedCollection<T>>,
    on_commit: F,
) where
    T: Sibling + Send + Sync + 'static,
    F: Fn(OrderedCollection<T>) + Clone + 'static,
{
    use wasm_bindgen::closure::Closure;

    let on_mousemove = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |ev: web_sys::MouseEvent| {
        if region.phase.get_untracked() == GesturePhase::Idle {
            return;
        }
        let y = ev.client_y() as f64;
        let input = GestureInput::PointerMove {
            x: ev.client_x() as f64,
            y,
            over_index: over_index(&container, y),
        };
        current.with_untracked(|current| region.dispatch(input, current));
    });

    let on_mouseup = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |ev: web_sys::MouseEvent| {
        if region.phase.get_untracked() == GesturePhase::Idle {
            return;
        }
        let input = GestureInput::PointerUp {
            over_index: over_index(&container, ev.client_y() as f64),
        };
        let event = current.with_untracked(|current| region.dispatch(input, current));
        if let Some(GestureEvent::Committed { sequence, .. }) = event {
            on_commit(sequence);
        }
    });

    let on_keydown = Closure::<dyn FnMut(web_sys::KeyboardEvent)>::new(move |ev: web_sys::KeyboardEvent| {
        if ev.default_prevented() || ev.key() != "Escape" {
            return;
        }
        if region.phase.get_untracked() == GesturePhase::Idle {
            return;
        }
        ev.prevent_default();
        current.with_untracked(|current| region.dispatch(GestureInput::Key(GestureKey::Cancel), current));
    });

    if let Some(doc) = web_sys::window().and_then(|win| win.document()) {
        let _ = doc.add_event_listener_with_callback("mousemove", on_mousemove.as_ref().unchecked_ref());
        let _ = doc.add_event_listener_with_callback("mouseup", on_mouseup.as_ref().unchecked_ref());
        let _ = doc.add_event_listener_with_callback("keydown", on_keydown.as_ref().unchecked_ref());
    }
    on_mousemove.forget();
    on_mouseup.forget();
    on_keydown.forget();
}
