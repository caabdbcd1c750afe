use rocket::http::Status;
use rocket::{Request, Route};

use crate::auth::{AuthFailure, NOT_AUTHENTICATED_DETAIL};
use crate::error::{ErrorReply, INTERNAL_ERROR_DETAIL};

pub mod auth;
pub mod categories;
pub mod courses;
pub mod enrollments;
pub mod roles;
pub mod task_completions;
pub mod tasks;
pub mod users;

pub fn routes() -> Vec<Route> {
    routes![
        auth::api_login,
        auth::api_me,
        auth::health,
        roles::api_list_roles,
        roles::api_get_role,
        roles::api_create_role,
        roles::api_update_role,
        roles::api_delete_role,
        users::api_list_users,
        users::api_get_user,
        users::api_create_user,
        users::api_update_user,
        users::api_delete_user,
        users::api_get_user_tasks_and_courses,
        categories::api_list_categories,
        categories::api_get_category,
        categories::api_create_category,
        categories::api_update_category,
        categories::api_delete_category,
        courses::api_list_courses,
        courses::api_get_course,
        courses::api_create_course,
        courses::api_update_course,
        courses::api_delete_course,
        enrollments::api_list_enrollments,
        enrollments::api_get_enrollment,
        enrollments::api_create_enrollment,
        enrollments::api_update_enrollment,
        enrollments::api_delete_enrollment,
        enrollments::api_get_task_completion_summary,
        tasks::api_list_tasks,
        tasks::api_get_task,
        tasks::api_create_task,
        tasks::api_update_task,
        tasks::api_delete_task,
        task_completions::api_list_task_completions,
        task_completions::api_get_task_completion,
        task_completions::api_create_task_completion,
        task_completions::api_update_task_completion,
        task_completions::api_delete_task_completion,
    ]
}

/// Renders router-level failures (guards, unmatched routes, unparsable
/// params and bodies) with the same JSON shape handlers use.
#[catch(default)]
pub fn default_catcher(status: Status, request: &Request) -> ErrorReply {
    let detail = match status.code {
        401 => request
            .local_cache(AuthFailure::default)
            .0
            .clone()
            .unwrap_or_else(|| NOT_AUTHENTICATED_DETAIL.to_string()),
        404 => "Not Found".to_string(),
        422 => "Request path, query or body could not be parsed".to_string(),
        500 => INTERNAL_ERROR_DETAIL.to_string(),
        _ => status.reason().unwrap_or("Request failed").to_string(),
    };

    ErrorReply::new(status, detail)
}
