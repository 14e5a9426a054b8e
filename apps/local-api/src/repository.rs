//! Entity repository — CRUD over `user` and `resumes[]` on top of the
//! document store. Every operation is one atomic read-modify-write cycle:
//! the backing store has no partial-update primitive, and caller-level
//! serialization (single-threaded cooperative scheduling, no await inside a
//! cycle) substitutes for locks.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use crate::defaults::{self, LOCAL_USER_ID};
use crate::errors::AppError;
use crate::models::{AuthPayload, MessagePayload, Resume, ResumePatch, User, UserPatch};
use crate::schema;
use crate::storage::DocumentStore;

pub const ACCESS_TOKEN: &str = "local-token";
pub const REFRESH_TOKEN: &str = "local-refresh-token";

pub struct Repository {
    store: DocumentStore,
}

impl Repository {
    pub fn new(store: DocumentStore) -> Self {
        Repository { store }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn get_user(&self) -> Result<Option<User>, AppError> {
        Ok(self.store.load()?.user)
    }

    /// Merges a patch into the user, creating a default user first if none
    /// exists. Stamps `updatedAt`.
    pub fn update_user(&self, patch: UserPatch) -> Result<User, AppError> {
        let mut doc = self.store.load()?;
        let user = doc.user.get_or_insert_with(defaults::default_user);
        user.apply_patch(patch);
        let updated = user.clone();
        self.store.save(&doc)?;
        Ok(updated)
    }

    pub fn get_resumes(&self) -> Result<Vec<Resume>, AppError> {
        Ok(self.store.load()?.resumes.into_values().collect())
    }

    pub fn get_resume_by_id(&self, id: &str) -> Result<Option<Resume>, AppError> {
        Ok(self.store.load()?.resumes.get(id).cloned())
    }

    pub fn create_resume(&self, name: Option<&str>) -> Result<Resume, AppError> {
        let mut doc = self.store.load()?;
        let user_id = doc
            .user
            .as_ref()
            .map(|u| u.id.clone())
            .unwrap_or_else(|| LOCAL_USER_ID.to_string());
        let resume = defaults::default_resume(&user_id, name);
        doc.insert_resume(resume.clone());
        self.store.save(&doc)?;
        info!(id = %resume.id, "created resume");
        Ok(resume)
    }

    /// Deep-merges a typed patch into the resume. NotFound if the id is
    /// absent; the document is left unmodified in that case.
    pub fn update_resume(&self, id: &str, patch: ResumePatch) -> Result<Resume, AppError> {
        let mut doc = self.store.load()?;
        let resume = doc
            .resumes
            .get_mut(id)
            .ok_or_else(AppError::resume_not_found)?;
        resume.apply_patch(patch);
        let updated = resume.clone();
        self.store.save(&doc)?;
        debug!(id = %id, "updated resume");
        Ok(updated)
    }

    /// Sets or clears the locked flag.
    pub fn lock_resume(&self, id: &str, set: bool) -> Result<Resume, AppError> {
        let mut doc = self.store.load()?;
        let resume = doc
            .resumes
            .get_mut(id)
            .ok_or_else(AppError::resume_not_found)?;
        resume.locked = set;
        resume.updated_at = Utc::now();
        let updated = resume.clone();
        self.store.save(&doc)?;
        Ok(updated)
    }

    /// Removes and returns the resume (callers may need the removed value,
    /// e.g. for undo toasts).
    pub fn delete_resume(&self, id: &str) -> Result<Resume, AppError> {
        let mut doc = self.store.load()?;
        // shift_remove keeps the remaining resumes in their original order.
        let removed = doc
            .resumes
            .shift_remove(id)
            .ok_or_else(AppError::resume_not_found)?;
        self.store.save(&doc)?;
        info!(id = %id, "deleted resume");
        Ok(removed)
    }

    /// Constructs a full resume from a loosely-shaped external object via
    /// the normalizer's defaulting rules. Keeps a present id, otherwise
    /// generates one; always stamps `updatedAt` to now.
    pub fn import_resume(&self, external: &Value) -> Result<Resume, AppError> {
        let mut doc = self.store.load()?;
        let user_id = doc
            .user
            .as_ref()
            .map(|u| u.id.clone())
            .unwrap_or_else(|| LOCAL_USER_ID.to_string());
        let mut resume = schema::normalize_resume(external, Some(&user_id));
        resume.user_id = user_id;
        resume.updated_at = Utc::now().max(resume.created_at);
        doc.insert_resume(resume.clone());
        self.store.save(&doc)?;
        info!(id = %resume.id, "imported resume");
        Ok(resume)
    }

    /// No remote authority exists to validate credentials; login only
    /// guarantees that a user record exists afterward.
    pub fn login(&self, email: &str, _password: &str) -> Result<AuthPayload, AppError> {
        let mut doc = self.store.load()?;
        let user = match doc.user.take() {
            Some(user) => user,
            None => {
                let mut user = defaults::default_user();
                user.email = email.to_string();
                user.username = email.split('@').next().unwrap_or("user").to_string();
                user.provider = "local".to_string();
                doc.user = Some(user.clone());
                self.store.save(&doc)?;
                info!("created user on first login");
                user
            }
        };
        Ok(AuthPayload {
            user,
            access_token: ACCESS_TOKEN.to_string(),
            refresh_token: REFRESH_TOKEN.to_string(),
        })
    }

    /// Replaces the user record unconditionally.
    pub fn register(&self, email: &str, _password: &str, name: &str) -> Result<AuthPayload, AppError> {
        let mut doc = self.store.load()?;
        let mut user = defaults::default_user();
        user.email = email.to_string();
        user.name = name.to_string();
        user.username = email.split('@').next().unwrap_or("user").to_string();
        user.provider = "local".to_string();
        doc.user = Some(user.clone());
        self.store.save(&doc)?;
        info!("registered user");
        Ok(AuthPayload {
            user,
            access_token: ACCESS_TOKEN.to_string(),
            refresh_token: REFRESH_TOKEN.to_string(),
        })
    }

    /// Local state is kept on logout; only the session shape is mirrored.
    pub fn logout(&self) -> MessagePayload {
        MessagePayload {
            message: "Logged out successfully".to_string(),
        }
    }

    pub fn clear_all_data(&self) -> Result<(), AppError> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{DEFAULT_EMAIL, SECTION_KEYS, UNTITLED_RESUME};
    use crate::models::{MetadataPatch, PagePatch, ResumeDataPatch, Visibility};
    use serde_json::json;

    fn repo() -> Repository {
        Repository::new(DocumentStore::in_memory())
    }

    #[test]
    fn test_empty_storage_scenario() {
        let repo = repo();
        assert!(repo.get_resumes().unwrap().is_empty());
        let user = repo.get_user().unwrap().expect("seeded user");
        assert_eq!(user.email, DEFAULT_EMAIL);
        assert!(!user.id.is_empty());
    }

    #[test]
    fn test_create_resume_round_trip() {
        let repo = repo();
        let created = repo.create_resume(Some("My CV")).unwrap();
        for key in SECTION_KEYS {
            let section = created.data.sections.fixed(key).unwrap();
            assert!(section.items.is_empty());
        }
        assert_eq!(created.visibility, Visibility::Private);
        let fetched = repo.get_resume_by_id(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_create_resume_ids_are_pairwise_distinct() {
        let repo = repo();
        let mut ids: Vec<String> = (0..8)
            .map(|_| repo.create_resume(None).unwrap().id)
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn test_create_without_name_uses_untitled_default() {
        let repo = repo();
        let created = repo.create_resume(None).unwrap();
        assert_eq!(created.name, UNTITLED_RESUME);
        assert!(created.slug.starts_with("untitled-"));
    }

    #[test]
    fn test_update_lowercases_page_format() {
        let repo = repo();
        let created = repo.create_resume(Some("My CV")).unwrap();
        let patch = ResumePatch {
            data: Some(ResumeDataPatch {
                metadata: Some(MetadataPatch {
                    page: Some(PagePatch {
                        format: Some("A4".into()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let updated = repo.update_resume(&created.id, patch).unwrap();
        assert_eq!(updated.data.metadata.page.format, "a4");
        let stored = repo.get_resume_by_id(&created.id).unwrap().unwrap();
        assert_eq!(stored.data.metadata.page.format, "a4");
    }

    #[test]
    fn test_update_missing_id_is_not_found_and_leaves_document_unmodified() {
        let repo = repo();
        let created = repo.create_resume(Some("Keep me")).unwrap();
        let err = repo
            .update_resume("missing", ResumePatch::default())
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(repo.get_resumes().unwrap(), vec![created]);
    }

    #[test]
    fn test_delete_returns_removed_resume() {
        let repo = repo();
        let created = repo.create_resume(Some("Doomed")).unwrap();
        let removed = repo.delete_resume(&created.id).unwrap();
        assert_eq!(removed, created);
        assert!(repo.get_resumes().unwrap().is_empty());
        let err = repo.delete_resume(&created.id).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_import_keeps_id_and_stamps_updated_at() {
        let repo = repo();
        let imported = repo
            .import_resume(&json!({
                "id": "external-id",
                "name": "Imported",
                "updatedAt": "2020-01-01T00:00:00Z",
                "data": { "metadata": { "page": { "format": "LETTER" } } }
            }))
            .unwrap();
        assert_eq!(imported.id, "external-id");
        assert_eq!(imported.data.metadata.page.format, "letter");
        // The source's stale timestamp is ignored.
        assert!(imported.updated_at >= imported.created_at);
        assert!(imported.updated_at.timestamp() > 1_600_000_000);
        let user = repo.get_user().unwrap().unwrap();
        assert_eq!(imported.user_id, user.id);
    }

    #[test]
    fn test_import_without_id_generates_one() {
        let repo = repo();
        let imported = repo.import_resume(&json!({ "name": "No Id" })).unwrap();
        assert!(!imported.id.is_empty());
    }

    #[test]
    fn test_login_creates_user_once_and_returns_session_shape() {
        let repo = repo();
        repo.store().clear().unwrap();
        repo.store()
            .save(&crate::models::Document::empty())
            .unwrap();
        let session = repo.login("jane@example.com", "hunter2").unwrap();
        assert_eq!(session.user.email, "jane@example.com");
        assert_eq!(session.user.username, "jane");
        assert_eq!(session.access_token, ACCESS_TOKEN);
        // A second login leaves the existing user untouched.
        let again = repo.login("other@example.com", "hunter2").unwrap();
        assert_eq!(again.user.email, "jane@example.com");
    }

    #[test]
    fn test_register_replaces_user() {
        let repo = repo();
        let session = repo.register("new@example.com", "pw", "New User").unwrap();
        assert_eq!(session.user.name, "New User");
        let user = repo.get_user().unwrap().unwrap();
        assert_eq!(user.email, "new@example.com");
    }

    #[test]
    fn test_update_user_creates_default_when_absent() {
        let repo = repo();
        repo.store().save(&crate::models::Document::empty()).unwrap();
        let updated = repo
            .update_user(UserPatch {
                name: Some("Patched".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.name, "Patched");
        assert_eq!(updated.email, DEFAULT_EMAIL);
    }

    #[test]
    fn test_clear_all_data_reseeds_on_next_read() {
        let repo = repo();
        repo.create_resume(Some("Gone after clear")).unwrap();
        repo.clear_all_data().unwrap();
        assert!(repo.get_resumes().unwrap().is_empty());
        assert!(repo.get_user().unwrap().is_some());
    }
}
