#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rocket::tokio;

    use crate::db::*;
    use crate::error::AppError;
    use crate::models::{
        CategoryCreate, CourseCreate, CourseUpdate, EnrollmentCreate, EnrollmentUpdate, RoleCreate,
        TaskCompletionCreate, TaskCompletionUpdate, TaskCreate, TaskUpdate, UserCreate, UserUpdate,
    };
    use crate::test::utils::{create_standard_test_db, TestDb, TestDbBuilder};

    fn enrollment_payload(test_db: &TestDb) -> EnrollmentCreate {
        EnrollmentCreate {
            student_id: test_db.user_id("student"),
            course_id: test_db.course_id("Rust 101"),
            assigner_id: test_db.user_id("assigner"),
            enrolled_at: Utc::now().date_naive(),
            deadline: None,
            completed_at: None,
            is_active: true,
        }
    }

    fn completion_payload(enrollment_id: i64, task_id: i64, is_active: bool) -> TaskCompletionCreate {
        TaskCompletionCreate {
            enrollment_id,
            task_id,
            completed_at: Some(Utc::now()),
            is_active,
        }
    }

    fn assert_not_found<T: std::fmt::Debug>(result: Result<T, AppError>, detail: &str) {
        match result {
            Err(AppError::NotFound(message)) => assert_eq!(message, detail),
            other => panic!("expected NotFound({}), got {:?}", detail, other),
        }
    }

    #[rocket::async_test]
    async fn soft_deleted_rows_are_hidden_from_get_but_kept() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let category_id = test_db.category_id("Programming");
        let deleted = deactivate_category(pool, category_id).await.unwrap();
        assert!(!deleted.is_active);
        assert_not_found(get_category(pool, category_id).await, "Category not found");
        let categories = list_categories(pool).await.unwrap();
        assert!(categories
            .iter()
            .any(|c| c.category_id == category_id && !c.is_active));

        let course_id = test_db.course_id("Rust 101");
        deactivate_course(pool, course_id).await.unwrap();
        assert_not_found(get_course(pool, course_id).await, "Course not found");
        assert_eq!(list_courses(pool).await.unwrap().len(), 1);

        assert_not_found(
            create_enrollment(pool, &enrollment_payload(&test_db)).await,
            "Course not found",
        );
    }

    #[rocket::async_test]
    async fn soft_deleted_enrollment_keeps_its_row() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let enrollment = create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();
        let deleted = deactivate_enrollment(pool, enrollment.enrollment_id)
            .await
            .unwrap();
        assert!(!deleted.is_active);

        assert_not_found(
            get_enrollment(pool, enrollment.enrollment_id).await,
            "Student course enrollment not found",
        );
        let all = list_enrollments(pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_active);

        let again = create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .expect("inactive enrollment does not block a new one");
        assert_ne!(again.enrollment_id, enrollment.enrollment_id);
    }

    #[rocket::async_test]
    async fn duplicate_active_enrollment_conflicts() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();
        let second = create_enrollment(pool, &enrollment_payload(&test_db)).await;

        match second {
            Err(AppError::Conflict(detail)) => {
                assert_eq!(detail, "Student course enrollment already exists")
            }
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[rocket::async_test]
    async fn concurrent_duplicate_enrollments_let_exactly_one_through() {
        let test_db = create_standard_test_db().await;

        let first = {
            let pool = test_db.pool.clone();
            let payload = enrollment_payload(&test_db);
            tokio::spawn(async move { create_enrollment(&pool, &payload).await })
        };
        let second = {
            let pool = test_db.pool.clone();
            let payload = enrollment_payload(&test_db);
            tokio::spawn(async move { create_enrollment(&pool, &payload).await })
        };

        let results = vec![first.await.unwrap(), second.await.unwrap()];
        let created = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict(_))))
            .count();

        assert_eq!(created, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(list_enrollments(&test_db.pool).await.unwrap().len(), 1);
    }

    #[rocket::async_test]
    async fn course_in_inactive_category_is_rejected_without_a_row() {
        let test_db = TestDbBuilder::new()
            .user("teacher")
            .category("Archived")
            .build()
            .await
            .unwrap();
        let pool = &test_db.pool;

        let category_id = test_db.category_id("Archived");
        deactivate_category(pool, category_id).await.unwrap();

        let payload = CourseCreate {
            title: "Legacy".to_string(),
            description: None,
            category_id,
            teacher_id: test_db.user_id("teacher"),
            deadline_in_days: None,
            is_active: true,
        };

        assert_not_found(create_course(pool, &payload).await, "Category not found");
        assert!(list_courses(pool).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn course_with_inactive_teacher_is_rejected() {
        let test_db = TestDbBuilder::new()
            .user("teacher")
            .category("Programming")
            .build()
            .await
            .unwrap();
        let pool = &test_db.pool;

        deactivate_user(pool, test_db.user_id("teacher")).await.unwrap();

        let payload = CourseCreate {
            title: "Rust 101".to_string(),
            description: None,
            category_id: test_db.category_id("Programming"),
            teacher_id: test_db.user_id("teacher"),
            deadline_in_days: None,
            is_active: true,
        };
        assert_not_found(create_course(pool, &payload).await, "Teacher not found");
    }

    #[rocket::async_test]
    async fn deactivated_user_is_not_found_and_empty_update_changes_nothing() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;
        let student_id = test_db.user_id("student");

        let before = get_user(pool, student_id).await.unwrap();
        let unchanged = update_user(pool, student_id, UserUpdate::default(), None)
            .await
            .unwrap();
        assert_eq!(unchanged, before);

        let update = UserUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        let deactivated = update_user(pool, student_id, update, None).await.unwrap();
        assert!(!deactivated.is_active);

        assert_not_found(get_user(pool, student_id).await, "User not found");
        assert!(list_users(pool)
            .await
            .unwrap()
            .iter()
            .all(|u| u.user_id != student_id));
        assert!(find_user_by_username(pool, "student")
            .await
            .unwrap()
            .is_some());
    }

    #[rocket::async_test]
    async fn user_update_with_unknown_role_is_rejected() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let update = UserUpdate {
            first_name: Some("Renamed".to_string()),
            role_id: Some(999),
            ..Default::default()
        };
        assert_not_found(
            update_user(pool, test_db.user_id("student"), update, None).await,
            "Role not found",
        );

        let user = get_user(pool, test_db.user_id("student")).await.unwrap();
        assert_eq!(user.first_name, "Test");
    }

    #[rocket::async_test]
    async fn duplicate_username_conflicts() {
        let test_db = create_standard_test_db().await;

        let payload = UserCreate {
            username: "student".to_string(),
            first_name: "Other".to_string(),
            last_name: "Student".to_string(),
            email: "other@example.com".to_string(),
            password: "password123".to_string(),
            role_id: test_db.role_id,
            is_active: true,
        };

        match create_user(&test_db.pool, &payload, "irrelevant-hash").await {
            Err(AppError::Conflict(detail)) => assert_eq!(detail, "Username already exists"),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[rocket::async_test]
    async fn users_embed_their_role() {
        let test_db = create_standard_test_db().await;
        let user = get_user(&test_db.pool, test_db.user_id("teacher"))
            .await
            .unwrap();

        assert_eq!(user.role.role_id, test_db.role_id);
        assert_eq!(user.role.name, "User");
        assert_eq!(user.role.description.as_deref(), Some("Default user role"));
    }

    #[rocket::async_test]
    async fn login_checks_the_hashed_password() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let user = authenticate_user(pool, "student", "password123")
            .await
            .unwrap();
        assert_eq!(user.map(|u| u.username).as_deref(), Some("student"));

        assert!(authenticate_user(pool, "student", "wrong-password")
            .await
            .unwrap()
            .is_none());
        assert!(authenticate_user(pool, "nobody", "password123")
            .await
            .unwrap()
            .is_none());
    }

    #[rocket::async_test]
    async fn task_completion_summary_counts_only_active_rows() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let enrollment = create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();
        let enrollment_id = enrollment.enrollment_id;

        let retired = create_task(
            pool,
            &TaskCreate {
                title: "Retired".to_string(),
                description: None,
                course_id: test_db.course_id("Rust 101"),
                is_active: true,
            },
        )
        .await
        .unwrap();
        create_task_completion(pool, &completion_payload(enrollment_id, retired.task_id, true))
            .await
            .unwrap();
        deactivate_task(pool, retired.task_id).await.unwrap();

        let ownership = test_db.task_id("Ownership");
        create_task_completion(pool, &completion_payload(enrollment_id, ownership, false))
            .await
            .unwrap();
        create_task_completion(pool, &completion_payload(enrollment_id, ownership, true))
            .await
            .unwrap();
        create_task_completion(
            pool,
            &completion_payload(enrollment_id, test_db.task_id("Borrowing"), false),
        )
        .await
        .unwrap();

        let progress = get_enrollment_progress(pool, test_db.user_id("student"), enrollment_id)
            .await
            .unwrap();

        assert_eq!(progress.total_tasks, 3);
        assert_eq!(progress.completed_tasks, 1);
        assert_eq!(progress.enrollment.enrollment_id, enrollment_id);
        assert!(progress.task_completions.iter().all(|tc| tc.is_active));
    }

    #[rocket::async_test]
    async fn task_completion_summary_requires_the_students_own_enrollment() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let enrollment = create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();

        assert_not_found(
            get_enrollment_progress(pool, test_db.user_id("teacher"), enrollment.enrollment_id)
                .await,
            "Student course enrollment not found",
        );

        deactivate_enrollment(pool, enrollment.enrollment_id)
            .await
            .unwrap();
        assert_not_found(
            get_enrollment_progress(pool, test_db.user_id("student"), enrollment.enrollment_id)
                .await,
            "Student course enrollment not found",
        );
    }

    #[rocket::async_test]
    async fn duplicate_active_completion_conflicts() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let enrollment = create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();
        let task_id = test_db.task_id("Ownership");

        create_task_completion(pool, &completion_payload(enrollment.enrollment_id, task_id, true))
            .await
            .unwrap();
        let second = create_task_completion(
            pool,
            &completion_payload(enrollment.enrollment_id, task_id, true),
        )
        .await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[rocket::async_test]
    async fn task_completion_and_role_deletes_remove_the_row() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let enrollment = create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();
        let completion = create_task_completion(
            pool,
            &completion_payload(enrollment.enrollment_id, test_db.task_id("Ownership"), true),
        )
        .await
        .unwrap();

        delete_task_completion(pool, completion.task_completion_id)
            .await
            .unwrap();
        assert!(list_task_completions(pool).await.unwrap().is_empty());
        assert_not_found(
            delete_task_completion(pool, completion.task_completion_id).await,
            "TaskCompletion not found",
        );

        let role = create_role(
            pool,
            &RoleCreate {
                name: "Teacher".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
        delete_role(pool, role.role_id).await.unwrap();
        assert_not_found(get_role(pool, role.role_id).await, "Role not found");
    }

    #[rocket::async_test]
    async fn role_in_use_cannot_be_deleted() {
        let test_db = create_standard_test_db().await;
        let result = delete_role(&test_db.pool, test_db.role_id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[rocket::async_test]
    async fn empty_role_table_is_not_found() {
        let test_db = TestDbBuilder::new().build().await.unwrap();
        let pool = &test_db.pool;

        assert_eq!(list_roles(pool).await.unwrap().len(), 1);
        delete_role(pool, test_db.role_id).await.unwrap();
        assert_not_found(list_roles(pool).await, "Roles not found");

        assert!(seed_default_role(pool).await.unwrap());
        assert!(!seed_default_role(pool).await.unwrap());
    }

    #[rocket::async_test]
    async fn inactive_task_cannot_be_updated() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;
        let task_id = test_db.task_id("Lifetimes");

        deactivate_task(pool, task_id).await.unwrap();
        let update = TaskUpdate {
            title: Some("Revived".to_string()),
            ..Default::default()
        };
        assert_not_found(update_task(pool, task_id, update).await, "Task not found");
        assert_eq!(list_tasks(pool).await.unwrap().len(), 2);
    }

    #[rocket::async_test]
    async fn partial_course_update_applies_only_present_fields() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;
        let course_id = test_db.course_id("Rust 101");

        let update: CourseUpdate =
            serde_json::from_str(r#"{"description": "Intro", "deadline_in_days": null}"#).unwrap();
        let course = update_course(pool, course_id, update).await.unwrap();

        assert_eq!(course.title, "Rust 101");
        assert_eq!(course.description.as_deref(), Some("Intro"));
        assert_eq!(course.deadline_in_days, None);
        assert!(course.is_active);

        let update = CourseUpdate {
            category_id: Some(404),
            ..Default::default()
        };
        assert_not_found(update_course(pool, course_id, update).await, "Category not found");
    }

    #[rocket::async_test]
    async fn category_update_to_inactive_is_applied() {
        let test_db = TestDbBuilder::new().build().await.unwrap();
        let pool = &test_db.pool;

        let category = create_category(
            pool,
            &CategoryCreate {
                name: "Design".to_string(),
                description: Some("Visual".to_string()),
                is_active: true,
            },
        )
        .await
        .unwrap();

        let update = serde_json::from_str(r#"{"is_active": false, "description": null}"#).unwrap();
        let updated = update_category(pool, category.category_id, update)
            .await
            .unwrap();

        assert!(!updated.is_active);
        assert_eq!(updated.description, None);
        assert_eq!(updated.name, "Design");
    }

    #[rocket::async_test]
    async fn tasks_and_courses_gathers_every_relation() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let enrollment = create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();
        create_task_completion(
            pool,
            &completion_payload(enrollment.enrollment_id, test_db.task_id("Borrowing"), true),
        )
        .await
        .unwrap();

        let teacher = get_user_tasks_and_courses(pool, test_db.user_id("teacher"))
            .await
            .unwrap();
        assert_eq!(teacher.created_courses.len(), 1);
        assert!(teacher.enrolled_courses.is_empty());

        let student = get_user_tasks_and_courses(pool, test_db.user_id("student"))
            .await
            .unwrap();
        assert_eq!(student.user.username, "student");
        assert_eq!(student.enrolled_courses.len(), 1);
        assert_eq!(student.task_completions.len(), 1);

        let assigner = get_user_tasks_and_courses(pool, test_db.user_id("assigner"))
            .await
            .unwrap();
        assert_eq!(assigner.assigned_courses.len(), 1);
        assert!(assigner.task_completions.is_empty());

        deactivate_user(pool, test_db.user_id("student")).await.unwrap();
        assert_not_found(
            get_user_tasks_and_courses(pool, test_db.user_id("student")).await,
            "User not found",
        );
    }

    #[rocket::async_test]
    async fn enrollment_with_unknown_assigner_is_rejected() {
        let test_db = create_standard_test_db().await;

        let mut payload = enrollment_payload(&test_db);
        payload.assigner_id = 4242;

        assert_not_found(
            create_enrollment(&test_db.pool, &payload).await,
            "Assigner not found",
        );
        assert!(list_enrollments(&test_db.pool).await.unwrap().is_empty());
    }

    fn assert_conflict<T: std::fmt::Debug>(result: Result<T, AppError>, detail: &str) {
        match result {
            Err(AppError::Conflict(message)) => assert_eq!(message, detail),
            other => panic!("expected Conflict({}), got {:?}", detail, other),
        }
    }

    #[rocket::async_test]
    async fn reactivating_an_enrollment_cannot_duplicate_an_active_one() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let first = create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();
        deactivate_enrollment(pool, first.enrollment_id).await.unwrap();
        create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();

        let reactivate = EnrollmentUpdate {
            is_active: Some(true),
            ..Default::default()
        };
        assert_conflict(
            update_enrollment(pool, first.enrollment_id, reactivate).await,
            "Student course enrollment already exists",
        );

        let rows = list_enrollments(pool).await.unwrap();
        assert_eq!(rows.iter().filter(|e| e.is_active).count(), 1);
    }

    #[rocket::async_test]
    async fn enrollment_update_checks_every_present_reference() {
        let test_db = TestDbBuilder::new()
            .user("teacher")
            .user("student")
            .user("assigner")
            .user("dropout")
            .category("Programming")
            .course("Rust 101", "Programming", "teacher")
            .course("Rust 201", "Programming", "teacher")
            .build()
            .await
            .unwrap();
        let pool = &test_db.pool;

        let enrollment = create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();
        let id = enrollment.enrollment_id;

        let missing_course = EnrollmentUpdate {
            course_id: Some(999),
            ..Default::default()
        };
        assert_not_found(update_enrollment(pool, id, missing_course).await, "Course not found");

        deactivate_course(pool, test_db.course_id("Rust 201")).await.unwrap();
        let inactive_course = EnrollmentUpdate {
            course_id: Some(test_db.course_id("Rust 201")),
            ..Default::default()
        };
        assert_not_found(update_enrollment(pool, id, inactive_course).await, "Course not found");

        deactivate_user(pool, test_db.user_id("dropout")).await.unwrap();
        let inactive_student = EnrollmentUpdate {
            student_id: Some(test_db.user_id("dropout")),
            ..Default::default()
        };
        assert_not_found(update_enrollment(pool, id, inactive_student).await, "Student not found");

        let missing_assigner = EnrollmentUpdate {
            assigner_id: Some(4242),
            ..Default::default()
        };
        assert_not_found(update_enrollment(pool, id, missing_assigner).await, "Assigner not found");

        let unchanged = get_enrollment(pool, id).await.unwrap();
        assert_eq!(unchanged.course_id, test_db.course_id("Rust 101"));
        assert_eq!(unchanged.student_id, test_db.user_id("student"));
        assert_eq!(unchanged.assigner_id, test_db.user_id("assigner"));
    }

    #[rocket::async_test]
    async fn reactivating_a_completion_cannot_duplicate_an_active_one() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let enrollment = create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();
        let task_id = test_db.task_id("Ownership");

        let inactive = create_task_completion(
            pool,
            &completion_payload(enrollment.enrollment_id, task_id, false),
        )
        .await
        .unwrap();
        create_task_completion(pool, &completion_payload(enrollment.enrollment_id, task_id, true))
            .await
            .unwrap();

        let reactivate = TaskCompletionUpdate {
            is_active: Some(true),
            ..Default::default()
        };
        assert_conflict(
            update_task_completion(pool, inactive.task_completion_id, reactivate).await,
            "TaskCompletion already exists",
        );
    }

    #[rocket::async_test]
    async fn completion_update_checks_every_present_reference() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let enrollment = create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();
        let completion = create_task_completion(
            pool,
            &completion_payload(enrollment.enrollment_id, test_db.task_id("Ownership"), true),
        )
        .await
        .unwrap();
        let id = completion.task_completion_id;

        let missing_task = TaskCompletionUpdate {
            task_id: Some(999),
            ..Default::default()
        };
        assert_not_found(update_task_completion(pool, id, missing_task).await, "Task not found");

        deactivate_task(pool, test_db.task_id("Lifetimes")).await.unwrap();
        let inactive_task = TaskCompletionUpdate {
            task_id: Some(test_db.task_id("Lifetimes")),
            ..Default::default()
        };
        assert_not_found(update_task_completion(pool, id, inactive_task).await, "Task not found");

        let missing_enrollment = TaskCompletionUpdate {
            enrollment_id: Some(999),
            ..Default::default()
        };
        assert_not_found(
            update_task_completion(pool, id, missing_enrollment).await,
            "Enrollment not found",
        );

        let unchanged = get_task_completion(pool, id).await.unwrap();
        assert_eq!(unchanged.task_id, test_db.task_id("Ownership"));
        assert_eq!(unchanged.enrollment_id, enrollment.enrollment_id);
    }

    #[rocket::async_test]
    async fn completion_update_clears_completed_at_only_when_null_is_sent() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;

        let enrollment = create_enrollment(pool, &enrollment_payload(&test_db))
            .await
            .unwrap();
        let completion = create_task_completion(
            pool,
            &completion_payload(enrollment.enrollment_id, test_db.task_id("Borrowing"), true),
        )
        .await
        .unwrap();
        let id = completion.task_completion_id;
        assert!(completion.completed_at.is_some());

        let absent: TaskCompletionUpdate = serde_json::from_str(r#"{"is_active": true}"#).unwrap();
        let kept = update_task_completion(pool, id, absent).await.unwrap();
        assert_eq!(kept.completed_at, completion.completed_at);

        let null: TaskCompletionUpdate =
            serde_json::from_str(r#"{"completed_at": null}"#).unwrap();
        let cleared = update_task_completion(pool, id, null).await.unwrap();
        assert_eq!(cleared.completed_at, None);
        assert!(cleared.is_active);
    }
}
