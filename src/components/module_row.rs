//! Module Row Component
//!
//! One draggable module: drag handle, title, 1-based position, expand
//! toggle for its lessons and delete.

use leptos::prelude::*;
use leptos_dragdrop::{make_on_keydown, make_on_mousedown};
use wasm_bindgen::JsCast;

use crate::components::{use_board, DeleteConfirmButton, LessonList};
use crate::models::Module;

#[component]
pub fn ModuleRow(module: Module) -> impl IntoView {
    let board = use_board();
    let region = board.region;
    let shown = board.shown;

    let id = module.id;
    let title = module.title.clone();
    let row_ref = NodeRef::<leptos::html::Div>::new();

    let on_mousedown = make_on_mousedown(region, id, shown);
    let on_keydown = make_on_keydown(region, id, shown, move |sequence| board.on_commit.run(sequence));

    let is_dragging = move || region.dragging_id.get() == Some(id);
    let position = move || shown.with(|s| s.position_of(id).map(|i| i + 1));
    let (expanded, set_expanded) = signal(board.cache().is_expanded(id));

    // Keyboard moves re-render the list; keep focus on the carried row
    Effect::new(move |_| {
        region.preview.track();
        if !is_dragging() {
            return;
        }
        if let Some(row) = row_ref.get_untracked() {
            let el: &web_sys::HtmlElement = row.unchecked_ref();
            let _ = el.focus();
        }
    });

    let toggle = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        if region.drag_just_ended.get_untracked() {
            return;
        }
        set_expanded.set(board.cache().toggle_expanded(id));
    };

    view! {
        <div class="module-item">
            <div
                class=move || if is_dragging() { "module-row dragging" } else { "module-row" }
                node_ref=row_ref
                data-drag-row=id.to_string()
                tabindex="0"
                role="listitem"
                aria-grabbed=move || is_dragging().to_string()
                on:keydown=on_keydown
            >
                <span
                    class="drag-handle"
                    title="Drag, or press Space and use the arrow keys"
                    on:mousedown=on_mousedown
                >
                    "⠿"
                </span>
                <span class="module-position">{move || position().map(|p| p.to_string()).unwrap_or_default()}</span>
                <span class="module-title">{title}</span>
                <button class="expand-btn" on:click=toggle>
                    {move || if expanded.get() { "▼" } else { "▶" }}
                </button>
                <DeleteConfirmButton
                    button_class="delete-btn"
                    on_confirm=Callback::new(move |_| board.delete_module(id))
                />
            </div>
            <Show when=move || expanded.get()>
                <LessonList module_id=id />
            </Show>
        </div>
    }
}
