//! Lesson Repository
//!
//! Lessons are appended under a module and listed in position order. They
//! are never dragged, so positions only grow.

use async_trait::async_trait;
use rusqlite::{Connection, params};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, Lesson, require_title};
use super::traits::Repository;

const LESSON_COLUMNS: &str = "id, module_id, title, position, created_at, updated_at";

pub struct LessonRepository {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl LessonRepository {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>) -> Self {
        Self { conn }
    }

    /// Lessons of one module, in position order
    pub async fn list_by_module(&self, module_id: u32) -> DomainResult<Vec<Lesson>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let sql = format!("SELECT {} FROM lessons WHERE module_id = ? ORDER BY position, id", LESSON_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt.query(params![module_id]).map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut lessons = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            lessons.push(row_to_lesson(row)?);
        }
        Ok(lessons)
    }
}

#[async_trait]
impl Repository<Lesson> for LessonRepository {
    async fn create(&self, entity: &Lesson) -> DomainResult<Lesson> {
        let title = require_title(&entity.title)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let module_exists: bool = conn
            .query_row("SELECT EXISTS(SELECT 1 FROM modules WHERE id = ?)", params![entity.module_id], |row| row.get(0))
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !module_exists {
            return Err(DomainError::NotFound(format!("Module {} not found", entity.module_id)));
        }

        let position: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(position), 0) + 1 FROM lessons WHERE module_id = ?",
                params![entity.module_id],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let now = chrono::Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO lessons (module_id, title, position, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            params![entity.module_id, title, position, now, now],
        )
        .map_err(|e| DomainError::Internal(e.to_string()))?;

        Ok(Lesson {
            id: conn.last_insert_rowid() as u32,
            module_id: entity.module_id,
            title,
            position,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Lesson>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let sql = format!("SELECT {} FROM lessons WHERE id = ?", LESSON_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt.query(params![id]).map_err(|e| DomainError::Internal(e.to_string()))?;

        match rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            Some(row) => Ok(Some(row_to_lesson(row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> DomainResult<Vec<Lesson>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let sql = format!("SELECT {} FROM lessons ORDER BY module_id, position", LESSON_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt.query([]).map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut lessons = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            lessons.push(row_to_lesson(row)?);
        }
        Ok(lessons)
    }

    async fn update(&self, entity: &Lesson) -> DomainResult<Lesson> {
        let title = require_title(&entity.title)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let now = chrono::Utc::now().timestamp_millis();
        let changed = conn.execute(
            "UPDATE lessons SET title = ?, updated_at = ? WHERE id = ?",
            params![title, now, entity.id],
        )
        .map_err(|e| DomainError::Internal(e.to_string()))?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Lesson {} not found", entity.id)));
        }

        Ok(Lesson { title, updated_at: Some(now), ..entity.clone() })
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        conn.execute("DELETE FROM lessons WHERE id = ?", params![id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(())
    }
}

fn row_to_lesson(row: &rusqlite::Row) -> DomainResult<Lesson> {
    Ok(Lesson {
        id: row.get(0).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        module_id: row.get(1).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        title: row.get(2).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        position: row.get::<_, i32>(3).unwrap_or(0),
        created_at: row.get::<_, Option<i64>>(4).unwrap_or(None),
        updated_at: row.get::<_, Option<i64>>(5).unwrap_or(None),
    })
}
