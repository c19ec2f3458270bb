//! Module Positioning Operations
//!
//! Reordering a course rewrites many positions under a UNIQUE
//! `(course_id, position)` index. Rows are moved in two phases inside one
//! transaction: first to `-target` (negative, so pairwise distinct and
//! outside the live range), then to `target`. The result is checked for
//! density before commit; any failure rolls the whole batch back.

use std::collections::HashSet;

use async_trait::async_trait;
use rusqlite::{Connection, params};
use sibling_order::{BatchPolicy, OrderUpdate};

use crate::domain::{DomainError, DomainResult};

/// Trait for module positioning operations
#[async_trait]
pub trait ModulePositioningOperations {
    /// Position a new module would get (`N+1`)
    async fn next_position(&self, course_id: u32) -> DomainResult<i32>;

    /// Apply a `{id, order}` batch atomically
    async fn persist_order(&self, course_id: u32, updates: &[OrderUpdate]) -> DomainResult<()>;

    /// Renumber a course to `1..N`, keeping relative order
    async fn compact(&self, course_id: u32) -> DomainResult<()>;
}

#[async_trait]
impl ModulePositioningOperations for super::module_repo::ModuleRepository {
    async fn next_position(&self, course_id: u32) -> DomainResult<i32> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;
        next_position_in(conn, course_id)
    }

    async fn persist_order(&self, course_id: u32, updates: &[OrderUpdate]) -> DomainResult<()> {
        validate_batch(course_id, updates)?;
        if updates.is_empty() {
            return Ok(());
        }

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let tx = conn.transaction()?;
        let current = sibling_ids(&tx, course_id)?;
        check_sibling_set(course_id, updates, &current, self.policy)?;
        write_two_phase(&tx, course_id, updates)?;
        ensure_dense(&tx, course_id)?;
        tx.commit()?;

        log::info!("Persisted order of {} modules in course {}", updates.len(), course_id);
        Ok(())
    }

    async fn compact(&self, course_id: u32) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let tx = conn.transaction()?;
        compact_in(&tx, course_id)?;
        ensure_dense(&tx, course_id)?;
        tx.commit()?;
        Ok(())
    }
}

pub(super) fn next_position_in(conn: &Connection, course_id: u32) -> DomainResult<i32> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(position), 0) + 1 FROM modules WHERE course_id = ?",
        params![course_id],
        |row| row.get(0),
    )?;
    Ok(next)
}

/// Ids under a course, in current position order
fn sibling_ids(conn: &Connection, course_id: u32) -> DomainResult<Vec<u32>> {
    let mut stmt = conn.prepare("SELECT id FROM modules WHERE course_id = ? ORDER BY position, id")?;
    let ids = stmt
        .query_map(params![course_id], |row| row.get(0))?
        .collect::<Result<Vec<u32>, _>>()?;
    Ok(ids)
}

/// Shape checks that need no database
fn validate_batch(course_id: u32, updates: &[OrderUpdate]) -> DomainResult<()> {
    let mut ids = HashSet::new();
    let mut orders = HashSet::new();
    for update in updates {
        if update.order < 1 {
            return Err(DomainError::InvalidInput(format!(
                "order {} for module {} is not positive",
                update.order, update.id
            )));
        }
        if !ids.insert(update.id) || !orders.insert(update.order) {
            return Err(DomainError::InvalidInput(format!(
                "batch for course {} repeats a module or an order",
                course_id
            )));
        }
    }
    Ok(())
}

/// A full batch must name exactly the stored siblings, a partial one only
/// stored siblings. Anything else means the set changed under the client.
fn check_sibling_set(
    course_id: u32,
    updates: &[OrderUpdate],
    current: &[u32],
    policy: BatchPolicy,
) -> DomainResult<()> {
    let current: HashSet<u32> = current.iter().copied().collect();
    if let Some(stranger) = updates.iter().find(|u| !current.contains(&u.id)) {
        return Err(DomainError::Conflict(format!(
            "module {} is not in course {}",
            stranger.id, course_id
        )));
    }
    if policy == BatchPolicy::Full && updates.len() != current.len() {
        return Err(DomainError::Conflict(format!(
            "course {} has {} modules but the batch names {}",
            course_id,
            current.len(),
            updates.len()
        )));
    }
    Ok(())
}

fn write_two_phase(conn: &Connection, course_id: u32, updates: &[OrderUpdate]) -> DomainResult<()> {
    let mut park = conn.prepare("UPDATE modules SET position = ? WHERE id = ? AND course_id = ?")?;
    for update in updates {
        let changed = park.execute(params![-update.order, update.id, course_id])?;
        if changed != 1 {
            return Err(DomainError::Conflict(format!("module {} vanished", update.id)));
        }
    }

    let now = chrono::Utc::now().timestamp_millis();
    let mut place = conn.prepare("UPDATE modules SET position = ?, updated_at = ? WHERE id = ? AND course_id = ?")?;
    for update in updates {
        place.execute(params![update.order, now, update.id, course_id])?;
    }
    Ok(())
}

/// Renumber to `1..N` with the two-phase write
pub(super) fn compact_in(conn: &Connection, course_id: u32) -> DomainResult<()> {
    let updates: Vec<OrderUpdate> = sibling_ids(conn, course_id)?
        .into_iter()
        .enumerate()
        .map(|(index, id)| OrderUpdate::new(id, index as i32 + 1))
        .collect();
    write_two_phase(conn, course_id, &updates)
}

pub(super) fn ensure_dense(conn: &Connection, course_id: u32) -> DomainResult<()> {
    let mut stmt = conn.prepare("SELECT position FROM modules WHERE course_id = ? ORDER BY position")?;
    let positions = stmt
        .query_map(params![course_id], |row| row.get::<_, i32>(0))?
        .collect::<Result<Vec<i32>, _>>()?;

    if let Some((index, position)) = positions
        .iter()
        .enumerate()
        .find(|(index, position)| **position != *index as i32 + 1)
    {
        return Err(DomainError::Conflict(format!(
            "course {} would have position {} at slot {}",
            course_id,
            position,
            index + 1
        )));
    }
    Ok(())
}
