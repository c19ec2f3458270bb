//! Lesson List Component
//!
//! Lessons of an expanded module, fetched once through the board's cache.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::components::use_board;

#[component]
pub fn LessonList(module_id: u32) -> impl IntoView {
    let board = use_board();
    let (version, set_version) = signal(0u32);
    let (new_title, set_new_title) = signal(String::new());
    let (add_error, set_add_error) = signal(None::<String>);

    let lessons = LocalResource::new(move || {
        version.track();
        let cache = board.cache();
        async move { cache.get_children(module_id).await.map(|list| (*list).clone()) }
    });

    let on_add = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let title = new_title.get();
        if title.trim().is_empty() { return; }

        spawn_local(async move {
            match commands::create_lesson(module_id, &title).await {
                Ok(_) => {
                    set_new_title.set(String::new());
                    set_add_error.set(None);
                    board.cache().invalidate(module_id);
                    set_version.update(|v| *v += 1);
                }
                Err(e) => set_add_error.set(Some(e.to_string())),
            }
        });
    };

    view! {
        <div class="lesson-list">
            {move || match lessons.get() {
                None => view! { <div class="lesson-loading">"Loading…"</div> }.into_any(),
                Some(Err(e)) => view! { <div class="lesson-error">{e.to_string()}</div> }.into_any(),
                Some(Ok(list)) if list.is_empty() => {
                    view! { <div class="lesson-empty">"No lessons yet"</div> }.into_any()
                }
                Some(Ok(list)) => view! {
                    <ol class="lessons">
                        {list.into_iter().map(|lesson| view! {
                            <li class="lesson-row">{lesson.title}</li>
                        }).collect_view()}
                    </ol>
                }.into_any(),
            }}

            <form class="new-lesson-form" on:submit=on_add>
                <input
                    type="text"
                    placeholder="Add lesson..."
                    prop:value=move || new_title.get()
                    on:input=move |ev| set_new_title.set(event_target_value(&ev))
                />
                <button type="submit">"Add"</button>
            </form>
            {move || add_error.get().map(|message| view! { <div class="lesson-error">{message}</div> })}
        </div>
    }
}
