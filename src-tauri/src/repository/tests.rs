//! Repository Integration Tests
//!
//! Course/module/lesson repositories against in-memory SQLite.

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::rc::Rc;

    use sibling_order::{
        BatchPolicy, MoveOutcome, OptimisticUpdateController, OrderPersistenceGateway, OrderUpdate,
        ReorderCommitQueue, ReorderConfig, ReorderError,
    };

    use crate::domain::{Course, DomainError, Lesson, Module};
    use crate::repository::{
        init_db, CourseRepository, DbState, LessonRepository, ModulePositioningOperations, ModuleRepository,
        Repository,
    };

    struct Fixture {
        db: DbState,
        courses: CourseRepository,
        modules: ModuleRepository,
        lessons: LessonRepository,
        course_id: u32,
        /// A, B, C, D at positions 1..4
        ids: [u32; 4],
    }

    async fn setup_with_policy(policy: BatchPolicy) -> Fixture {
        // Use in-memory database for tests
        let db = init_db(&PathBuf::from(":memory:")).await.expect("Failed to init test DB");
        let courses = CourseRepository::new(db.conn.clone());
        let modules = ModuleRepository::new(db.conn.clone(), policy);
        let lessons = LessonRepository::new(db.conn.clone());

        let course = courses.create(&Course::new(0, "Rust 101".to_string())).await.unwrap();
        let mut ids = [0; 4];
        for (slot, title) in ids.iter_mut().zip(["A", "B", "C", "D"]) {
            *slot = modules.create(&Module::new(0, course.id, title.to_string())).await.unwrap().id;
        }

        Fixture { db, courses, modules, lessons, course_id: course.id, ids }
    }

    async fn setup() -> Fixture {
        setup_with_policy(BatchPolicy::Full).await
    }

    async fn order(f: &Fixture) -> Vec<(String, i32)> {
        f.modules
            .list_by_course(f.course_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| (m.title, m.position))
            .collect()
    }

    fn pairs(expected: &[(&str, i32)]) -> Vec<(String, i32)> {
        expected.iter().map(|(t, p)| (t.to_string(), *p)).collect()
    }

    #[tokio::test]
    async fn test_create_appends_at_tail() {
        let f = setup().await;
        assert_eq!(order(&f).await, pairs(&[("A", 1), ("B", 2), ("C", 3), ("D", 4)]));

        assert_eq!(f.modules.next_position(f.course_id).await.unwrap(), 5);
        let e = f.modules.create(&Module::new(0, f.course_id, "  E  ".to_string())).await.unwrap();
        assert_eq!(e.position, 5);
        assert_eq!(e.title, "E");
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let f = setup().await;
        let blank = f.modules.create(&Module::new(0, f.course_id, "   ".to_string())).await;
        assert!(matches!(blank, Err(DomainError::InvalidInput(_))));

        let orphan = f.modules.create(&Module::new(0, 999, "X".to_string())).await;
        assert!(matches!(orphan, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_naive_row_by_row_update_hits_unique_index() {
        let f = setup().await;
        let [_, _, c, _] = f.ids;

        let guard = f.db.conn.lock().await;
        let conn = guard.as_ref().unwrap();
        let result = conn.execute("UPDATE modules SET position = 1 WHERE id = ?", [c]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_two_phase_persist_under_unique_index() {
        let f = setup().await;
        let [a, b, c, d] = f.ids;

        let batch = vec![
            OrderUpdate::new(c, 1),
            OrderUpdate::new(a, 2),
            OrderUpdate::new(b, 3),
            OrderUpdate::new(d, 4),
        ];
        f.modules.persist_order(f.course_id, &batch).await.unwrap();
        assert_eq!(order(&f).await, pairs(&[("C", 1), ("A", 2), ("B", 3), ("D", 4)]));

        // Same batch again is a no-op
        f.modules.persist_order(f.course_id, &batch).await.unwrap();
        assert_eq!(order(&f).await, pairs(&[("C", 1), ("A", 2), ("B", 3), ("D", 4)]));
    }

    #[tokio::test]
    async fn test_rejected_batch_leaves_rows_untouched() {
        let f = setup().await;
        let [a, b, c, d] = f.ids;
        let before = order(&f).await;

        // Gap at 4: fails the density check after both phases ran
        let gap = vec![
            OrderUpdate::new(d, 1),
            OrderUpdate::new(a, 2),
            OrderUpdate::new(b, 3),
            OrderUpdate::new(c, 5),
        ];
        let err = f.modules.persist_order(f.course_id, &gap).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(order(&f).await, before);

        let duplicate = vec![OrderUpdate::new(a, 1), OrderUpdate::new(b, 1)];
        let err = f.modules.persist_order(f.course_id, &duplicate).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert_eq!(order(&f).await, before);
    }

    #[tokio::test]
    async fn test_full_batch_rejected_after_concurrent_create() {
        let f = setup().await;
        let [a, b, c, d] = f.ids;
        f.modules.create(&Module::new(0, f.course_id, "E".to_string())).await.unwrap();

        let stale = vec![
            OrderUpdate::new(b, 1),
            OrderUpdate::new(a, 2),
            OrderUpdate::new(c, 3),
            OrderUpdate::new(d, 4),
        ];
        let err = f.modules.persist_order(f.course_id, &stale).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(order(&f).await, pairs(&[("A", 1), ("B", 2), ("C", 3), ("D", 4), ("E", 5)]));
    }

    #[tokio::test]
    async fn test_batch_naming_a_foreign_module_is_rejected() {
        let f = setup().await;
        let [a, b, c, _] = f.ids;
        let other = f.courses.create(&Course::new(0, "Other".to_string())).await.unwrap();
        let stranger = f.modules.create(&Module::new(0, other.id, "Z".to_string())).await.unwrap();

        let batch = vec![
            OrderUpdate::new(a, 1),
            OrderUpdate::new(b, 2),
            OrderUpdate::new(c, 3),
            OrderUpdate::new(stranger.id, 4),
        ];
        let err = f.modules.persist_order(f.course_id, &batch).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(f.modules.find_by_id(stranger.id).await.unwrap().unwrap().position, 1);
    }

    #[tokio::test]
    async fn test_changed_only_policy_accepts_subset() {
        let f = setup_with_policy(BatchPolicy::ChangedOnly).await;
        let [a, b, _, _] = f.ids;

        let swap = vec![OrderUpdate::new(b, 1), OrderUpdate::new(a, 2)];
        f.modules.persist_order(f.course_id, &swap).await.unwrap();
        assert_eq!(order(&f).await, pairs(&[("B", 1), ("A", 2), ("C", 3), ("D", 4)]));
    }

    #[tokio::test]
    async fn test_delete_compacts_and_cascades() {
        let f = setup().await;
        let [_, b, _, _] = f.ids;
        f.lessons.create(&Lesson::new(0, b, "Intro".to_string())).await.unwrap();

        f.modules.delete(b).await.unwrap();
        assert_eq!(order(&f).await, pairs(&[("A", 1), ("C", 2), ("D", 3)]));
        assert!(f.lessons.list_by_module(b).await.unwrap().is_empty());

        let missing = f.modules.delete(b).await;
        assert!(matches!(missing, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_compact_repairs_gaps() {
        let f = setup().await;
        let [_, _, _, d] = f.ids;
        {
            let guard = f.db.conn.lock().await;
            let conn = guard.as_ref().unwrap();
            conn.execute("UPDATE modules SET position = 10 WHERE id = ?", [d]).unwrap();
        }

        f.modules.compact(f.course_id).await.unwrap();
        assert_eq!(order(&f).await, pairs(&[("A", 1), ("B", 2), ("C", 3), ("D", 4)]));
    }

    #[tokio::test]
    async fn test_rename_keeps_position() {
        let f = setup().await;
        let [_, _, c, _] = f.ids;
        let mut module = f.modules.find_by_id(c).await.unwrap().unwrap();
        module.title = "Ownership".to_string();
        module.position = 1;

        let updated = f.modules.update(&module).await.unwrap();
        assert_eq!(updated.title, "Ownership");
        assert_eq!(updated.position, 3);
    }

    #[tokio::test]
    async fn test_lessons_append_in_order() {
        let f = setup().await;
        let [a, _, _, _] = f.ids;
        for title in ["One", "Two", "Three"] {
            f.lessons.create(&Lesson::new(0, a, title.to_string())).await.unwrap();
        }

        let lessons = f.lessons.list_by_module(a).await.unwrap();
        let titles: Vec<&str> = lessons.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
        assert_eq!(lessons.iter().map(|l| l.position).collect::<Vec<_>>(), vec![1, 2, 3]);

        let orphan = f.lessons.create(&Lesson::new(0, 999, "Lost".to_string())).await;
        assert!(matches!(orphan, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_course_delete_cascades() {
        let f = setup().await;
        f.courses.delete(f.course_id).await.unwrap();
        assert!(f.courses.find_by_id(f.course_id).await.unwrap().is_none());
        assert!(f.modules.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_controller_drives_sqlite() {
        let f = setup().await;
        let [a, b, c, d] = f.ids;
        let course_id = f.course_id;

        let config = ReorderConfig::default();
        let queue = Rc::new(ReorderCommitQueue::new(OrderPersistenceGateway::new(f.modules, &config)));
        let controller = OptimisticUpdateController::load(queue.clone(), course_id).await.unwrap();
        assert_eq!(controller.rendered().ids(), vec![a, b, c, d]);

        assert_eq!(controller.perform_move(c, 0).await, MoveOutcome::Confirmed);
        let stored = queue.gateway().store().list_by_course(course_id).await.unwrap();
        assert_eq!(stored.iter().map(|m| m.id).collect::<Vec<_>>(), vec![c, a, b, d]);

        let e = controller.create("E".to_string()).await.unwrap();
        assert_eq!(e.position, 5);
        controller.delete(a).await.unwrap();
        assert_eq!(controller.rendered().ids(), vec![c, b, d, e.id]);
        let stored = queue.gateway().store().list_by_course(course_id).await.unwrap();
        assert_eq!(stored.iter().map(|m| m.position).collect::<Vec<_>>(), vec![1, 2, 3, 4]);

        // Another session adds a module: the full batch no longer matches
        let other_session = ModuleRepository::new(f.db.conn.clone(), BatchPolicy::Full);
        other_session.create(&Module::new(0, course_id, "F".to_string())).await.unwrap();

        let outcome = controller.perform_move(d, 0).await;
        assert!(matches!(outcome, MoveOutcome::RolledBack(ReorderError::TransactionRejected(_))));
        assert_eq!(controller.rendered().ids(), vec![c, b, d, e.id]);
        let stored = other_session.list_by_course(course_id).await.unwrap();
        assert_eq!(stored.iter().map(|m| m.title.as_str()).collect::<Vec<_>>(), vec!["C", "B", "D", "E", "F"]);

        // A refresh picks up the new sibling and the retry goes through
        assert!(controller.refresh().await.unwrap());
        assert_eq!(controller.perform_move(d, 0).await, MoveOutcome::Confirmed);
    }
}
