//! API-shape adapter — maps verb+path+body triples onto repository calls and
//! wraps results into the envelope a network call would produce. This is the
//! only contract boundary toward the UI layer; unmatched paths answer with an
//! empty success envelope so callers degrade gracefully.

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::defaults::DEFAULT_EMAIL;
use crate::errors::AppError;
use crate::models::{ResumePatch, UserPatch};
use crate::repository::Repository;

/// Success envelope: status plus the JSON payload a remote API would return.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub data: Value,
}

impl ApiResponse {
    fn ok<T: Serialize>(data: &T) -> Result<Self, AppError> {
        Ok(ApiResponse {
            status: StatusCode::OK,
            data: serde_json::to_value(data)?,
        })
    }

    fn empty() -> Self {
        ApiResponse {
            status: StatusCode::OK,
            data: json!({}),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateResumeBody {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CredentialsBody {
    email: String,
    password: String,
    name: String,
}

impl Default for CredentialsBody {
    fn default() -> Self {
        CredentialsBody {
            email: DEFAULT_EMAIL.to_string(),
            password: String::new(),
            name: "Signimus User".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LockBody {
    set: bool,
}

impl Default for LockBody {
    fn default() -> Self {
        LockBody { set: true }
    }
}

pub struct LocalApi {
    repo: Repository,
}

impl LocalApi {
    pub fn new(repo: Repository) -> Self {
        LocalApi { repo }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Routes a request the way the remote API would. PUT is treated
    /// identically to PATCH. Errors carry an HTTP-like status and a
    /// human-readable message, mirroring a thrown network error.
    pub async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, AppError> {
        debug!(%method, path, "dispatching local request");
        let method = if method == Method::PUT {
            Method::PATCH
        } else {
            method
        };
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match (method.as_str(), segments.as_slice()) {
            ("GET", ["user", "me"]) => ApiResponse::ok(&self.repo.get_user()?),
            ("PATCH", ["user", "me"]) => {
                let patch: UserPatch = parse_body(body)?;
                ApiResponse::ok(&self.repo.update_user(patch)?)
            }

            ("GET", ["resume"]) => ApiResponse::ok(&self.repo.get_resumes()?),
            ("POST", ["resume"]) => {
                let body: CreateResumeBody = parse_body(body)?;
                ApiResponse::ok(&self.repo.create_resume(body.name.as_deref())?)
            }
            ("POST", ["resume", "import"]) => {
                let external = body.unwrap_or_else(|| json!({}));
                ApiResponse::ok(&self.repo.import_resume(&external)?)
            }
            ("GET", ["resume", id]) => {
                let resume = self
                    .repo
                    .get_resume_by_id(id)?
                    .ok_or_else(AppError::resume_not_found)?;
                ApiResponse::ok(&resume)
            }
            ("PATCH", ["resume", id]) => {
                let patch: ResumePatch = parse_body(body)?;
                ApiResponse::ok(&self.repo.update_resume(id, patch)?)
            }
            ("PATCH", ["resume", id, "lock"]) => {
                let body: LockBody = parse_body(body)?;
                ApiResponse::ok(&self.repo.lock_resume(id, body.set)?)
            }
            ("DELETE", ["resume", id]) => ApiResponse::ok(&self.repo.delete_resume(id)?),

            ("POST", ["auth", "login"]) => {
                let creds: CredentialsBody = parse_body(body)?;
                ApiResponse::ok(&self.repo.login(&creds.email, &creds.password)?)
            }
            ("POST", ["auth", "register"]) => {
                let creds: CredentialsBody = parse_body(body)?;
                ApiResponse::ok(&self.repo.register(&creds.email, &creds.password, &creds.name)?)
            }
            ("POST", ["auth", "logout"]) => ApiResponse::ok(&self.repo.logout()),

            ("GET", ["feature", "flags"]) => Ok(ApiResponse {
                status: StatusCode::OK,
                data: json!({
                    "isSignupsDisabled": false,
                    "isEmailAuthDisabled": false,
                }),
            }),

            // Unmatched endpoints succeed with empty data to keep the
            // calling UI resilient.
            _ => Ok(ApiResponse::empty()),
        }
    }
}

fn parse_body<T: serde::de::DeserializeOwned + Default>(body: Option<Value>) -> Result<T, AppError> {
    match body {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => {
            serde_json::from_value(value).map_err(|e| AppError::Validation(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DocumentStore;
    use serde_json::json;

    fn api() -> LocalApi {
        LocalApi::new(Repository::new(DocumentStore::in_memory()))
    }

    #[tokio::test]
    async fn test_get_user_me_returns_seeded_user() {
        let api = api();
        let response = api.dispatch(Method::GET, "/user/me", None).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.data["email"], DEFAULT_EMAIL);
    }

    #[tokio::test]
    async fn test_resume_crud_through_dispatch() {
        let api = api();
        let created = api
            .dispatch(Method::POST, "/resume", Some(json!({ "name": "My CV" })))
            .await
            .unwrap();
        let id = created.data["id"].as_str().unwrap().to_string();
        assert_eq!(created.data["name"], "My CV");
        assert_eq!(created.data["visibility"], "private");

        let listed = api.dispatch(Method::GET, "/resume", None).await.unwrap();
        assert_eq!(listed.data.as_array().unwrap().len(), 1);

        let patched = api
            .dispatch(
                Method::PATCH,
                &format!("/resume/{id}"),
                Some(json!({ "data": { "metadata": { "page": { "format": "A4" } } } })),
            )
            .await
            .unwrap();
        assert_eq!(patched.data["data"]["metadata"]["page"]["format"], "a4");

        let deleted = api
            .dispatch(Method::DELETE, &format!("/resume/{id}"), None)
            .await
            .unwrap();
        assert_eq!(deleted.data["id"], id.as_str());

        let listed = api.dispatch(Method::GET, "/resume", None).await.unwrap();
        assert!(listed.data.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_resume_maps_to_404_envelope() {
        let api = api();
        for (method, body) in [
            (Method::GET, None),
            (Method::PATCH, Some(json!({}))),
            (Method::DELETE, None),
        ] {
            let err = api
                .dispatch(method, "/resume/missing", body)
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::NOT_FOUND);
            assert_eq!(err.to_string(), "Resume not found");
        }
    }

    #[tokio::test]
    async fn test_put_is_treated_as_patch() {
        let api = api();
        let created = api
            .dispatch(Method::POST, "/resume", Some(json!({})))
            .await
            .unwrap();
        let id = created.data["id"].as_str().unwrap();
        let updated = api
            .dispatch(
                Method::PUT,
                &format!("/resume/{id}"),
                Some(json!({ "name": "Via PUT" })),
            )
            .await
            .unwrap();
        assert_eq!(updated.data["name"], "Via PUT");
    }

    #[tokio::test]
    async fn test_auth_endpoints_return_session_shape() {
        let api = api();
        let login = api
            .dispatch(
                Method::POST,
                "/auth/login",
                Some(json!({ "email": "jane@example.com", "password": "pw" })),
            )
            .await
            .unwrap();
        assert_eq!(login.data["accessToken"], "local-token");
        assert_eq!(login.data["refreshToken"], "local-refresh-token");
        assert!(login.data["user"]["id"].is_string());

        let register = api
            .dispatch(
                Method::POST,
                "/auth/register",
                Some(json!({ "email": "new@example.com", "password": "pw", "name": "New" })),
            )
            .await
            .unwrap();
        assert_eq!(register.data["user"]["name"], "New");

        let logout = api.dispatch(Method::POST, "/auth/logout", None).await.unwrap();
        assert_eq!(logout.data["message"], "Logged out successfully");
    }

    #[tokio::test]
    async fn test_unmatched_path_returns_empty_success() {
        let api = api();
        let response = api
            .dispatch(Method::GET, "/contributors/github", None)
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.data, json!({}));
    }

    #[tokio::test]
    async fn test_lock_route_sets_and_clears_flag() {
        let api = api();
        let created = api
            .dispatch(Method::POST, "/resume", Some(json!({ "name": "Lockable" })))
            .await
            .unwrap();
        let id = created.data["id"].as_str().unwrap().to_string();
        let locked = api
            .dispatch(Method::PATCH, &format!("/resume/{id}/lock"), None)
            .await
            .unwrap();
        assert_eq!(locked.data["locked"], true);
        let unlocked = api
            .dispatch(
                Method::PATCH,
                &format!("/resume/{id}/lock"),
                Some(json!({ "set": false })),
            )
            .await
            .unwrap();
        assert_eq!(unlocked.data["locked"], false);
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_validation_error() {
        let api = api();
        let created = api
            .dispatch(Method::POST, "/resume", Some(json!({})))
            .await
            .unwrap();
        let id = created.data["id"].as_str().unwrap();
        let err = api
            .dispatch(
                Method::PATCH,
                &format!("/resume/{id}"),
                Some(json!({ "visibility": 42 })),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_feature_flags_supplement() {
        let api = api();
        let flags = api.dispatch(Method::GET, "/feature/flags", None).await.unwrap();
        assert_eq!(flags.data["isSignupsDisabled"], false);
    }
}
