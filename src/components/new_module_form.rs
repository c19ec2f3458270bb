//! New Module Form Component
//!
//! Appends a module at the end of the current course.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::use_board;

#[component]
pub fn NewModuleForm() -> impl IntoView {
    let board = use_board();

    let (new_title, set_new_title) = signal(String::new());
    let (error, set_error) = signal(None::<String>);

    let create_module = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let title = new_title.get();
        if title.trim().is_empty() { return; }
        let Some(controller) = board.controller() else { return };

        spawn_local(async move {
            match controller.create(title).await {
                Ok(_) => {
                    set_new_title.set(String::new());
                    set_error.set(None);
                }
                Err(e) => set_error.set(Some(e.to_string())),
            }
        });
    };

    view! {
        <form class="new-module-form" on:submit=create_module>
            <div class="new-module-row">
                <input
                    type="text"
                    placeholder="Add module..."
                    prop:value=move || new_title.get()
                    on:input=move |ev| set_new_title.set(event_target_value(&ev))
                />
                <button type="submit">"Add"</button>
            </div>
            {move || error.get().map(|message| view! { <div class="form-error">{message}</div> })}
        </form>
    }
}
