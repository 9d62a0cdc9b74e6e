use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::io::api::{ApiError, Backend, Credentials, LoginResponse};
use crate::model::comment::{Comment, NewComment};
use crate::model::config::ApiConfig;
use crate::model::id::Id;
use crate::model::project::{NewProject, Project};
use crate::model::task::{NewTask, Task, TaskStatus};
use crate::model::user::{NewUser, User};

/// `Backend` over the REST API, authenticated with a bearer token.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Shape of an error body (`{"message": "..."}`)
#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &ApiConfig, token: Option<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(HttpBackend {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request. Everything under `/api` needs a token.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => Ok(builder.bearer_auth(token)),
            None if path.starts_with("/api") => Err(ApiError::NotAuthenticated),
            None => Ok(builder),
        }
    }

    /// Send and return the raw body of a successful response
    fn send(&self, builder: RequestBuilder, endpoint: &str) -> Result<String, ApiError> {
        tracing::debug!(endpoint, "backend request");
        let response = builder.send()?;
        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            let err = error_from_body(status.as_u16(), &text);
            tracing::debug!(endpoint, status = status.as_u16(), error = %err, "backend rejected request");
            return Err(err);
        }
        Ok(text)
    }

    fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder, endpoint: &str) -> Result<T, ApiError> {
        let text = self.send(builder, endpoint)?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source: e,
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(self.request(Method::GET, path)?, path)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.fetch(self.request(Method::POST, path)?.json(body), path)
    }

    /// `PATCH /api/tasks/{id}/status?status=IN_PROGRESS`; the new status
    /// travels in the query string, not the body.
    fn status_request(&self, task_id: &Id, status: TaskStatus) -> Result<RequestBuilder, ApiError> {
        let path = format!("/api/tasks/{}/status", task_id);
        Ok(self
            .request(Method::PATCH, &path)?
            .query(&[("status", status.wire())]))
    }
}

/// Error for a non-2xx response: the body's `message` when it has a
/// non-blank one, otherwise the generic status text.
fn error_from_body(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message);
    ApiError::backend(status, message)
}

impl Backend for HttpBackend {
    fn register(&self, user: &NewUser) -> Result<(), ApiError> {
        let path = "/auth/signup";
        self.send(self.request(Method::POST, path)?.json(user), path).map(|_| ())
    }

    fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.post_json("/auth/login", credentials)
    }

    fn current_user(&self) -> Result<User, ApiError> {
        self.get("/api/users/me")
    }

    fn get_user(&self, user_id: &Id) -> Result<User, ApiError> {
        self.get(&format!("/api/users/{}", user_id))
    }

    fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get("/api/users/")
    }

    fn my_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get("/api/projects/my-projects")
    }

    fn get_project(&self, project_id: &Id) -> Result<Project, ApiError> {
        self.get(&format!("/api/projects/{}", project_id))
    }

    fn project_ids_for_user(&self, user_id: &Id) -> Result<Vec<Id>, ApiError> {
        self.get(&format!("/api/projects/user/{}/ids", user_id))
    }

    fn create_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        self.post_json("/api/projects", project)
    }

    fn add_member(&self, project_id: &Id, user_id: &Id) -> Result<(), ApiError> {
        let path = format!("/api/projects/{}/members/{}", project_id, user_id);
        self.send(self.request(Method::POST, &path)?, &path).map(|_| ())
    }

    fn remove_member(&self, project_id: &Id, user_id: &Id) -> Result<(), ApiError> {
        let path = format!("/api/projects/{}/members/{}", project_id, user_id);
        self.send(self.request(Method::DELETE, &path)?, &path).map(|_| ())
    }

    fn list_tasks(&self, project_id: &Id) -> Result<Vec<Task>, ApiError> {
        self.get(&format!("/api/projects/{}/tasks", project_id))
    }

    fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        self.post_json("/api/tasks", task)
    }

    fn update_task_status(&self, task_id: &Id, status: TaskStatus) -> Result<Task, ApiError> {
        let builder = self.status_request(task_id, status)?;
        self.fetch(builder, &format!("/api/tasks/{}/status", task_id))
    }

    fn assign_task(&self, task_id: &Id, user_id: &Id) -> Result<Task, ApiError> {
        let path = format!("/api/tasks/{}/assignee/{}", task_id, user_id);
        self.fetch(self.request(Method::POST, &path)?, &path)
    }

    fn unassign_task(&self, task_id: &Id) -> Result<Task, ApiError> {
        let path = format!("/api/tasks/{}/assignee", task_id);
        self.fetch(self.request(Method::DELETE, &path)?, &path)
    }

    fn delete_task(&self, task_id: &Id) -> Result<(), ApiError> {
        let path = format!("/api/tasks/{}", task_id);
        self.send(self.request(Method::DELETE, &path)?, &path).map(|_| ())
    }

    fn list_comments(&self, project_id: &Id) -> Result<Vec<Comment>, ApiError> {
        self.get(&format!("/api/projects/{}/comments", project_id))
    }

    fn create_comment(&self, project_id: &Id, comment: &NewComment) -> Result<Comment, ApiError> {
        self.post_json(&format!("/api/projects/{}/comments", project_id), comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(token: Option<&str>) -> HttpBackend {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9/".to_string(),
            timeout_secs: 1,
        };
        HttpBackend::new(&config, token.map(str::to_string)).unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        assert_eq!(backend(None).url("/api/users/me"), "http://127.0.0.1:9/api/users/me");
    }

    #[test]
    fn api_calls_without_token_fail_before_sending() {
        let err = backend(None).current_user().unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
    }

    #[test]
    fn auth_routes_do_not_need_a_token() {
        assert!(backend(None).request(Method::POST, "/auth/login").is_ok());
    }

    #[test]
    fn error_body_message_is_used() {
        let err = error_from_body(403, r#"{"message":"Only the assignee can change status"}"#);
        assert_eq!(err.to_string(), "Only the assignee can change status");
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn error_body_without_message_falls_back_to_status() {
        for body in [r#"{"message":"  "}"#, r#"{"message":null}"#, r#"{"error":"x"}"#, "<html>Bad Gateway</html>", ""] {
            let err = error_from_body(502, body);
            assert_eq!(err.to_string(), "HTTP error! status: 502", "body {:?}", body);
        }
    }

    #[test]
    fn status_change_goes_in_query_string() {
        let request = backend(Some("tok"))
            .status_request(&Id::from("3"), TaskStatus::InProgress)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(request.url().as_str(), "http://127.0.0.1:9/api/tasks/3/status?status=IN_PROGRESS");
        assert_eq!(request.headers()["authorization"], "Bearer tok");
        assert!(request.body().is_none());
    }
}
