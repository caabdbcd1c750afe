use std::collections::HashMap;

use jsonwebtoken::Algorithm;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use sqlx::{Pool, Sqlite};

use crate::auth::PasswordHasher;
use crate::config::{AppConfig, AuthConfig, TelemetryConfig};
use crate::db;
use crate::error::AppError;
use crate::init_rocket;
use crate::models::{CategoryCreate, CourseCreate, TaskCreate, UserCreate};

pub const STANDARD_PASSWORD: &str = "password123";
pub const TEST_SECRET: &str = "test-secret-key";
const TEST_HASH_COST: u32 = 4;

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        auth: AuthConfig {
            secret_key: TEST_SECRET.to_string(),
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: 15,
            password_hash_cost: TEST_HASH_COST,
        },
        cors_allowed_origins: vec!["*".to_string()],
        telemetry: TelemetryConfig {
            otlp_endpoint: None,
            honeycomb_api_key: None,
            environment: "test".to_string(),
        },
    }
}

struct TestCourse {
    title: String,
    category: String,
    teacher: String,
}

struct TestTask {
    title: String,
    course: String,
}

#[derive(Default)]
pub struct TestDbBuilder {
    users: Vec<String>,
    categories: Vec<String>,
    courses: Vec<TestCourse>,
    tasks: Vec<TestTask>,
}

impl TestDbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, username: &str) -> Self {
        self.users.push(username.to_string());
        self
    }

    pub fn category(mut self, name: &str) -> Self {
        self.categories.push(name.to_string());
        self
    }

    pub fn course(mut self, title: &str, category: &str, teacher: &str) -> Self {
        self.courses.push(TestCourse {
            title: title.to_string(),
            category: category.to_string(),
            teacher: teacher.to_string(),
        });
        self
    }

    pub fn task(mut self, title: &str, course: &str) -> Self {
        self.tasks.push(TestTask {
            title: title.to_string(),
            course: course.to_string(),
        });
        self
    }

    pub async fn build(self) -> Result<TestDb, AppError> {
        let pool = db::connect("sqlite::memory:").await?;
        db::run_migrations(&pool).await?;
        db::seed_default_role(&pool).await?;

        let role_id = db::list_roles(&pool).await?[0].role_id;
        let hasher = PasswordHasher::new(TEST_HASH_COST);
        let password_hash = hasher.hash(STANDARD_PASSWORD.to_string()).await?;

        let mut user_ids = HashMap::new();
        for username in &self.users {
            let payload = UserCreate {
                username: username.clone(),
                first_name: "Test".to_string(),
                last_name: username.clone(),
                email: format!("{}@example.com", username),
                password: STANDARD_PASSWORD.to_string(),
                role_id,
                is_active: true,
            };
            let user = db::create_user(&pool, &payload, &password_hash).await?;
            user_ids.insert(username.clone(), user.user_id);
        }

        let mut category_ids = HashMap::new();
        for name in &self.categories {
            let payload = CategoryCreate {
                name: name.clone(),
                description: None,
                is_active: true,
            };
            let category = db::create_category(&pool, &payload).await?;
            category_ids.insert(name.clone(), category.category_id);
        }

        let mut course_ids = HashMap::new();
        for course in &self.courses {
            let payload = CourseCreate {
                title: course.title.clone(),
                description: None,
                category_id: category_ids[&course.category],
                teacher_id: user_ids[&course.teacher],
                deadline_in_days: Some(30),
                is_active: true,
            };
            let created = db::create_course(&pool, &payload).await?;
            course_ids.insert(course.title.clone(), created.course_id);
        }

        let mut task_ids = HashMap::new();
        for task in &self.tasks {
            let payload = TaskCreate {
                title: task.title.clone(),
                description: None,
                course_id: course_ids[&task.course],
                is_active: true,
            };
            let created = db::create_task(&pool, &payload).await?;
            task_ids.insert(task.title.clone(), created.task_id);
        }

        Ok(TestDb {
            pool,
            role_id,
            user_ids,
            category_ids,
            course_ids,
            task_ids,
        })
    }
}

pub struct TestDb {
    pub pool: Pool<Sqlite>,
    pub role_id: i64,
    user_ids: HashMap<String, i64>,
    category_ids: HashMap<String, i64>,
    course_ids: HashMap<String, i64>,
    task_ids: HashMap<String, i64>,
}

impl TestDb {
    pub fn user_id(&self, username: &str) -> i64 {
        self.user_ids[username]
    }

    pub fn category_id(&self, name: &str) -> i64 {
        self.category_ids[name]
    }

    pub fn course_id(&self, title: &str) -> i64 {
        self.course_ids[title]
    }

    pub fn task_id(&self, title: &str) -> i64 {
        self.task_ids[title]
    }
}

/// A teacher, a student and an assigner around one course with three tasks.
pub async fn create_standard_test_db() -> TestDb {
    TestDbBuilder::new()
        .user("teacher")
        .user("student")
        .user("assigner")
        .category("Programming")
        .course("Rust 101", "Programming", "teacher")
        .task("Ownership", "Rust 101")
        .task("Borrowing", "Rust 101")
        .task("Lifetimes", "Rust 101")
        .build()
        .await
        .expect("Failed to build test database")
}

pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
    let rocket = init_rocket(test_db.pool.clone(), &test_config());
    let client = Client::tracked(rocket)
        .await
        .expect("valid rocket instance");
    (client, test_db)
}

pub async fn login_test_user(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post("/auth/token")
        .header(ContentType::Form)
        .body(format!("username={}&password={}", username, password))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);

    let body: serde_json::Value = response
        .into_json()
        .await
        .expect("token response");
    body["access_token"]
        .as_str()
        .expect("access_token in response")
        .to_string()
}
