//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity.

use leptos::prelude::*;
use reactive_stores::Store;
use sibling_order::ReorderConfig;
use crate::models::Course;

/// Global application state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct AppState {
    /// All courses
    pub courses: Vec<Course>,
    /// Course whose modules are on the board
    pub current_course_id: Option<u32>,
    /// Loaded once from the backend; the board mounts after it arrives
    pub reorder_config: Option<ReorderConfig>,
}

/// Type alias for the store
pub type AppStore = Store<AppState>;

/// Get the app store from context
pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

/// Replace the course list, keeping the selection when it still exists
pub fn store_set_courses(store: &AppStore, courses: Vec<Course>) {
    let current = store.current_course_id().get_untracked();
    let keep = current.filter(|id| courses.iter().any(|c| c.id == *id));
    let selected = keep.or_else(|| courses.first().map(|c| c.id));
    store.courses().set(courses);
    if selected != current {
        store.current_course_id().set(selected);
    }
}

/// Add a course and select it
pub fn store_add_course(store: &AppStore, course: Course) {
    let id = course.id;
    store.courses().write().push(course);
    store.current_course_id().set(Some(id));
}
