//! Course Repository
//!
//! SQLite-backed CRUD for courses. Deleting a course cascades to its modules
//! and lessons.

use async_trait::async_trait;
use rusqlite::{Connection, params};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{Course, DomainError, DomainResult, require_title};
use super::traits::Repository;

pub struct CourseRepository {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl CourseRepository {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Repository<Course> for CourseRepository {
    async fn create(&self, entity: &Course) -> DomainResult<Course> {
        let title = require_title(&entity.title)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let now = chrono::Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO courses (title, created_at, updated_at) VALUES (?, ?, ?)",
            params![title, now, now],
        )
        .map_err(|e| DomainError::Internal(e.to_string()))?;

        Ok(Course {
            id: conn.last_insert_rowid() as u32,
            title,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Course>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let mut stmt = conn.prepare("SELECT id, title, created_at, updated_at FROM courses WHERE id = ?")
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt.query(params![id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        match rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            Some(row) => Ok(Some(row_to_course(row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> DomainResult<Vec<Course>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let mut stmt = conn.prepare("SELECT id, title, created_at, updated_at FROM courses ORDER BY id")
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt.query([])
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut courses = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            courses.push(row_to_course(row)?);
        }
        Ok(courses)
    }

    async fn update(&self, entity: &Course) -> DomainResult<Course> {
        let title = require_title(&entity.title)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let now = chrono::Utc::now().timestamp_millis();
        let changed = conn.execute(
            "UPDATE courses SET title = ?, updated_at = ? WHERE id = ?",
            params![title, now, entity.id],
        )
        .map_err(|e| DomainError::Internal(e.to_string()))?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Course {} not found", entity.id)));
        }

        Ok(Course { title, updated_at: Some(now), ..entity.clone() })
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        conn.execute("DELETE FROM courses WHERE id = ?", params![id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(())
    }
}

fn row_to_course(row: &rusqlite::Row) -> DomainResult<Course> {
    Ok(Course {
        id: row.get(0).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        title: row.get(1).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        created_at: row.get::<_, Option<i64>>(2).unwrap_or(None),
        updated_at: row.get::<_, Option<i64>>(3).unwrap_or(None),
    })
}
