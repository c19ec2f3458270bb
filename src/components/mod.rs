//! UI Components
//!
//! Reusable Leptos components.

mod course_tab_bar;
mod module_board;
mod module_row;
mod lesson_list;
mod commit_status;
mod new_module_form;
mod delete_confirm_button;

pub use course_tab_bar::CourseTabBar;
pub use module_board::{use_board, BoardContext, ModuleBoard};
pub use module_row::ModuleRow;
pub use lesson_list::LessonList;
pub use commit_status::CommitStatusBanner;
pub use new_module_form::NewModuleForm;
pub use delete_confirm_button::DeleteConfirmButton;
