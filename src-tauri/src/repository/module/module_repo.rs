//! Module Repository - Core CRUD Operations
//!
//! Modules are created at the tail of their course and deleting one closes
//! the gap in the same transaction, so positions stay `1..N`.

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use sibling_order::BatchPolicy;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, Module, require_title};
use super::super::traits::Repository;
use super::module_positioning::{compact_in, ensure_dense, next_position_in};

pub(super) const MODULE_COLUMNS: &str = "id, course_id, title, position, created_at, updated_at";

/// SQLite implementation of Module repository
pub struct ModuleRepository {
    pub(super) conn: Arc<Mutex<Option<Connection>>>,
    /// Shape of reorder batches the client sends; decides how strictly a
    /// batch must match the stored sibling set
    pub(super) policy: BatchPolicy,
}

impl ModuleRepository {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>, policy: BatchPolicy) -> Self {
        Self { conn, policy }
    }

    /// Modules of one course, in position order
    pub async fn list_by_course(&self, course_id: u32) -> DomainResult<Vec<Module>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let sql = format!("SELECT {} FROM modules WHERE course_id = ? ORDER BY position, id", MODULE_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt.query(params![course_id]).map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut modules = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            modules.push(row_to_module(row)?);
        }
        Ok(modules)
    }
}

#[async_trait]
impl Repository<Module> for ModuleRepository {
    /// Appends at `N+1`; `entity.position` is ignored.
    async fn create(&self, entity: &Module) -> DomainResult<Module> {
        let title = require_title(&entity.title)?;
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let tx = conn.transaction().map_err(|e| DomainError::Internal(e.to_string()))?;
        let course_exists: bool = tx
            .query_row("SELECT EXISTS(SELECT 1 FROM courses WHERE id = ?)", params![entity.course_id], |row| row.get(0))
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !course_exists {
            return Err(DomainError::NotFound(format!("Course {} not found", entity.course_id)));
        }

        let position = next_position_in(&tx, entity.course_id)?;
        let now = chrono::Utc::now().timestamp_millis();
        tx.execute(
            "INSERT INTO modules (course_id, title, position, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            params![entity.course_id, title, position, now, now],
        )
        .map_err(|e| DomainError::Internal(e.to_string()))?;
        let id = tx.last_insert_rowid() as u32;
        tx.commit().map_err(|e| DomainError::Internal(e.to_string()))?;

        log::info!("Created module {} at position {} of course {}", id, position, entity.course_id);
        Ok(Module {
            id,
            course_id: entity.course_id,
            title,
            position,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Module>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let sql = format!("SELECT {} FROM modules WHERE id = ?", MODULE_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt.query(params![id]).map_err(|e| DomainError::Internal(e.to_string()))?;

        match rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            Some(row) => Ok(Some(row_to_module(row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> DomainResult<Vec<Module>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let sql = format!("SELECT {} FROM modules ORDER BY course_id, position", MODULE_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt.query([]).map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut modules = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            modules.push(row_to_module(row)?);
        }
        Ok(modules)
    }

    /// Renames; position and course are owned by the ordering operations.
    async fn update(&self, entity: &Module) -> DomainResult<Module> {
        let title = require_title(&entity.title)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let now = chrono::Utc::now().timestamp_millis();
        let changed = conn.execute(
            "UPDATE modules SET title = ?, updated_at = ? WHERE id = ?",
            params![title, now, entity.id],
        )
        .map_err(|e| DomainError::Internal(e.to_string()))?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Module {} not found", entity.id)));
        }

        let sql = format!("SELECT {} FROM modules WHERE id = ?", MODULE_COLUMNS);
        conn.query_row(&sql, params![entity.id], |row| Ok(row_to_module(row)))
            .map_err(|e| DomainError::Internal(e.to_string()))?
    }

    /// Deletes the module (lessons cascade) and compacts its course.
    async fn delete(&self, id: u32) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let tx = conn.transaction().map_err(|e| DomainError::Internal(e.to_string()))?;
        let course_id: u32 = tx
            .query_row("SELECT course_id FROM modules WHERE id = ?", params![id], |row| row.get(0))
            .optional()
            .map_err(|e| DomainError::Internal(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Module {} not found", id)))?;

        tx.execute("DELETE FROM modules WHERE id = ?", params![id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        compact_in(&tx, course_id)?;
        ensure_dense(&tx, course_id)?;
        tx.commit().map_err(|e| DomainError::Internal(e.to_string()))?;

        log::info!("Deleted module {} from course {}", id, course_id);
        Ok(())
    }
}

/// Convert a database row to Module
pub(super) fn row_to_module(row: &rusqlite::Row) -> DomainResult<Module> {
    Ok(Module {
        id: row.get(0).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        course_id: row.get(1).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        title: row.get(2).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        position: row.get(3).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        created_at: row.get::<_, Option<i64>>(4).unwrap_or(None),
        updated_at: row.get::<_, Option<i64>>(5).unwrap_or(None),
    })
}
