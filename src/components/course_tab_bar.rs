//! Course Tab Bar Component
//!
//! Tab bar for switching between courses.

use leptos::prelude::*;
use leptos::task::spawn_local;
use crate::commands;
use crate::context::AppContext;
use crate::store::{store_add_course, use_app_store, AppStateStoreFields};

#[component]
pub fn CourseTabBar() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let store = use_app_store();
    let (adding, set_adding) = signal(false);
    let (new_title, set_new_title) = signal(String::new());

    let on_add = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let title = new_title.get();
        if title.trim().is_empty() { return; }

        spawn_local(async move {
            match commands::create_course(&title).await {
                Ok(course) => store_add_course(&store, course),
                Err(e) => ctx.show_notice(format!("Could not create course: {}", e)),
            }
        });

        set_new_title.set(String::new());
        set_adding.set(false);
    };

    view! {
        <nav class="course-tab-bar">
            <For
                each=move || store.courses().get()
                key=|course| (course.id, course.title.clone())
                children=move |course| {
                    let id = course.id;
                    let tab_class = move || {
                        if store.current_course_id().get() == Some(id) { "course-tab active" } else { "course-tab" }
                    };

                    view! {
                        <button
                            class=tab_class
                            on:click=move |_| store.current_course_id().set(Some(id))
                        >
                            {course.title.clone()}
                        </button>
                    }
                }
            />

            {move || if adding.get() {
                view! {
                    <form class="course-add-form" on:submit=on_add>
                        <input
                            type="text"
                            placeholder="Course title"
                            prop:value=move || new_title.get()
                            on:input=move |ev| set_new_title.set(event_target_value(&ev))
                        />
                        <button type="submit">"+"</button>
                        <button type="button" on:click=move |_| set_adding.set(false)>"×"</button>
                    </form>
                }.into_any()
            } else {
                view! {
                    <button class="course-add-btn" on:click=move |_| set_adding.set(true)>"+"</button>
                }.into_any()
            }}
        </nav>
    }
}
