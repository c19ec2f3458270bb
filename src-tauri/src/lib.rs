//! Course Dashboard Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: SQLite data access, including atomic module reordering
//! - commands: Tauri command handlers (`desktop` feature)

mod config;
mod domain;
mod repository;
#[cfg(feature = "desktop")]
mod commands;

pub use config::AppConfig;
pub use domain::{Course, DomainError, DomainResult, Entity, Lesson, Module};
pub use repository::{
    init_db, CourseRepository, DbState, LessonRepository, ModulePositioningOperations, ModuleRepository,
    Repository,
};

/// Application state shared across commands
#[cfg(feature = "desktop")]
pub struct AppState {
    pub db_state: DbState,
    pub config: AppConfig,
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    tauri::Builder::default()
        .setup(|app| {
            // Single instance check - must be first!
            #[cfg(desktop)]
            app.handle().plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
                if let Some(window) = app.get_webview_window("main") {
                    let _ = window.set_focus();
                }
            }))?;

            let paths = app.path();
            let config = AppConfig::load(&paths.app_config_dir()?.join("config.json"));

            rolling_logger::init_logger(paths.app_log_dir()?, &config.log_app_name)?;

            let data_dir = paths.app_data_dir()?;
            std::fs::create_dir_all(&data_dir)?;
            let db_path = data_dir.join(&config.db_file);

            let db_state = match tauri::async_runtime::block_on(init_db(&db_path)) {
                Ok(state) => state,
                Err(e) => {
                    rolling_logger::error(&format!("DB init failed: {}", e));
                    return Err(e.into());
                }
            };

            rolling_logger::info(&format!("App setup complete, reorder config: {:?}", config.reorder));
            app.manage(AppState { db_state, config });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::list_courses,
            commands::create_course,
            commands::list_modules,
            commands::create_module,
            commands::delete_module,
            commands::persist_module_order,
            commands::list_lessons,
            commands::create_lesson,
            commands::get_reorder_config,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
