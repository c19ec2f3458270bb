//! Module Board Component
//!
//! Modules of the selected course as one draggable list. The order shown
//! comes from the optimistic controller; drops go through the commit queue
//! and a failed commit snaps the list back to the last confirmed order.

use std::rc::Rc;

use leptos::html::Div;
use leptos::prelude::*;
use leptos::task::spawn_local;
use gloo_timers::future::TimeoutFuture;
use sibling_order::{
    ChildContentCache, CommitStatus, MoveOutcome, OptimisticUpdateController, OrderPersistenceGateway,
    OrderedCollection, ReorderCommitQueue, ReorderConfig,
};
use leptos_dragdrop::{bind_global_listeners, DragRegion};

use crate::components::{CommitStatusBanner, ModuleRow, NewModuleForm};
use crate::context::AppContext;
use crate::gateway::TauriModuleStore;
use crate::models::Module;
use crate::store::{use_app_store, AppStateStoreFields};

type Controller = OptimisticUpdateController<Rc<TauriModuleStore>>;

/// Engine handles shared by every row of the board
#[derive(Clone, Copy)]
pub struct BoardContext {
    controller: StoredValue<Option<Rc<Controller>>, LocalStorage>,
    cache: StoredValue<Rc<ChildContentCache<TauriModuleStore>>, LocalStorage>,
    pub region: DragRegion<Module>,
    /// Preview while dragging, otherwise the rendered order
    pub shown: Signal<OrderedCollection<Module>>,
    pub on_commit: Callback<OrderedCollection<Module>>,
}

impl BoardContext {
    pub fn controller(&self) -> Option<Rc<Controller>> {
        self.controller.get_value()
    }

    pub fn cache(&self) -> Rc<ChildContentCache<TauriModuleStore>> {
        self.cache.get_value()
    }

    /// Delete a module; the backend closes the gap in the same transaction.
    pub fn delete_module(&self, id: u32) {
        let Some(controller) = self.controller() else { return };
        let cache = self.cache();
        spawn_local(async move {
            match controller.delete(id).await {
                Ok(()) => cache.evict(id),
                Err(e) => log::error!("Failed to delete module {}: {}", id, e),
            }
        });
    }
}

pub fn use_board() -> BoardContext {
    expect_context::<BoardContext>()
}

#[component]
pub fn ModuleBoard(config: ReorderConfig) -> impl IntoView {
    let store = use_app_store();
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    let timeout_ms = config.commit_timeout_ms;
    let refetch_delay_ms = config.refetch_delay_ms;
    let queue = StoredValue::new_local(Rc::new(ReorderCommitQueue::new(OrderPersistenceGateway::new(
        Rc::new(TauriModuleStore::new(timeout_ms)),
        &config,
    ))));
    let cache = StoredValue::new_local(Rc::new(ChildContentCache::new(TauriModuleStore::new(timeout_ms))));
    let controller: StoredValue<Option<Rc<Controller>>, LocalStorage> = StoredValue::new_local(None);

    let rendered = RwSignal::new(OrderedCollection::<Module>::empty(0));
    let status = RwSignal::new(CommitStatus::Idle);
    let (load_error, set_load_error) = signal(None::<String>);
    let region = DragRegion::<Module>::new(&config);
    let container = NodeRef::<Div>::new();

    let shown = Signal::derive(move || region.preview.get().unwrap_or_else(|| rendered.get()));

    let on_commit = Callback::new(move |sequence: OrderedCollection<Module>| {
        let Some(controller) = controller.get_value() else { return };
        // Shown now, in the same tick the drag preview goes away
        let staged = match controller.stage_sequence(sequence) {
            Ok(staged) => staged,
            Err(outcome) => {
                log::debug!("Drop on course {} not committed: {:?}", controller.parent_id(), outcome);
                return;
            }
        };
        spawn_local(async move {
            let outcome = controller.commit_staged(staged).await;
            log::debug!("Reorder of course {} finished: {:?}", controller.parent_id(), outcome);
            if outcome != MoveOutcome::Confirmed {
                return;
            }
            // Pick up changes made by other sessions once things settle
            if let Some(delay) = refetch_delay_ms {
                TimeoutFuture::new(delay).await;
                if let Err(e) = controller.refresh().await {
                    log::warn!("Refetch after reorder failed: {}", e);
                }
            }
        });
    });

    let board = BoardContext {
        controller,
        cache,
        region,
        shown,
        on_commit,
    };
    provide_context(board);

    bind_global_listeners(region, container, shown, move |sequence| on_commit.run(sequence));

    // (Re)load the board whenever the selected course changes
    Effect::new(move |_| {
        let course_id = store.current_course_id().get();
        region.reset();
        controller.set_value(None);
        set_load_error.set(None);
        rendered.set(OrderedCollection::empty(course_id.unwrap_or(0)));
        status.set(CommitStatus::Idle);

        let Some(course_id) = course_id else { return };
        let queue = queue.get_value();
        spawn_local(async move {
            match Controller::load(queue, course_id).await {
                Ok(loaded) => {
                    // A newer selection owns the board now
                    if store.current_course_id().get_untracked() != Some(course_id) {
                        return;
                    }
                    loaded.subscribe(move |sequence, commit_status| {
                        if store.current_course_id().get_untracked() != Some(course_id) {
                            return;
                        }
                        rendered.set(sequence.clone());
                        status.set(commit_status.clone());
                    });
                    rendered.set(loaded.rendered());
                    controller.set_value(Some(Rc::new(loaded)));
                }
                Err(e) => set_load_error.set(Some(format!("Could not load modules: {}", e))),
            }
        });
    });

    // Manual reload also refreshes the board
    Effect::new(move |prev: Option<u32>| {
        let trigger = ctx.reload_trigger.get();
        if prev.is_some() {
            if let Some(controller) = controller.get_value() {
                spawn_local(async move {
                    if let Err(e) = controller.refresh().await {
                        ctx.show_notice(format!("Could not refresh modules: {}", e));
                    }
                });
            }
        }
        trigger
    });

    view! {
        <section class="module-board">
            <CommitStatusBanner status=status.read_only() />

            {move || load_error.get().map(|message| view! { <div class="load-error">{message}</div> })}

            <div class="module-list" role="list" node_ref=container>
                <For
                    each=move || shown.get().into_items()
                    key=|module| (module.id, module.title.clone())
                    children=move |module| view! { <ModuleRow module=module /> }
                />
            </div>

            {move || store.current_course_id().get().is_some().then(|| view! { <NewModuleForm /> })}
        </section>
    }
}
