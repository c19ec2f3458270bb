//! Course Dashboard App
//!
//! Course tabs on top, the module board of the selected course below.

use leptos::prelude::*;
use leptos::task::spawn_local;
use reactive_stores::Store;
use sibling_order::ReorderConfig;

use crate::commands;
use crate::context::AppContext;
use crate::components::{CourseTabBar, ModuleBoard};
use crate::store::{store_set_courses, AppState, AppStateStoreFields, AppStore};

#[component]
pub fn App() -> impl IntoView {
    let store: AppStore = Store::new(AppState::default());
    provide_context(store);

    let (reload_trigger, set_reload_trigger) = signal(0u32);
    let (notice, set_notice) = signal(None::<String>);
    let ctx = AppContext::new((reload_trigger, set_reload_trigger), (notice, set_notice));
    provide_context(ctx);

    // Reorder settings, once
    spawn_local(async move {
        let config = match commands::get_reorder_config().await {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Using default reorder config: {}", e);
                ReorderConfig::default()
            }
        };
        store.reorder_config().set(Some(config));
    });

    // Load courses on mount and on reload
    Effect::new(move |_| {
        let trigger = reload_trigger.get();
        spawn_local(async move {
            match commands::list_courses().await {
                Ok(loaded) => {
                    log::debug!("Loaded {} courses, trigger={}", loaded.len(), trigger);
                    store_set_courses(&store, loaded);
                }
                Err(e) => ctx.show_notice(format!("Could not load courses: {}", e)),
            }
        });
    });

    view! {
        <div class="app-layout">
            <header class="app-header">
                <h1>"Course Dashboard"</h1>
                <button class="reload-btn" title="Reload from disk" on:click=move |_| ctx.reload()>"⟳"</button>
            </header>

            <CourseTabBar />

            {move || ctx.notice.get().map(|message| view! {
                <div class="notice" role="alert">
                    <span>{message}</span>
                    <button class="dismiss-btn" on:click=move |_| ctx.clear_notice()>"×"</button>
                </div>
            })}

            {move || store.reorder_config().get().map(|config| view! { <ModuleBoard config=config /> })}
        </div>
    }
}
