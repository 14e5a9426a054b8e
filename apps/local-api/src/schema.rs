//! Schema normalizer — repairs documents written by older schema versions so
//! every data-model invariant holds after load. Never fails: unparseable
//! input degrades to the empty document. Idempotent by construction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::defaults::{
    self, default_layout, default_section, section_display_name, DEFAULT_PAGE_FORMAT,
    DEFAULT_TEMPLATE, LOCAL_USER_ID, UNTITLED_RESUME,
};
use crate::errors::AppError;
use crate::models::{
    resume::slugify, Basics, Css, Document, Layout, Metadata, Page, PageOptions, Resume,
    ResumeData, Section, Sections, Theme, Typography, User, Visibility,
};

/// Parses the raw stored value. The only error this module produces; callers
/// recover by falling back to `Document::empty()`.
pub fn parse_raw(raw: &str) -> Result<Value, AppError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| AppError::MalformedStorage(e.to_string()))?;
    if !value.is_object() {
        return Err(AppError::MalformedStorage(
            "stored value is not an object".to_string(),
        ));
    }
    Ok(value)
}

/// `normalize(raw) -> Document`, the §4.1 contract.
pub fn normalize(raw: &str) -> Document {
    match parse_raw(raw) {
        Ok(value) => normalize_value(&value),
        Err(err) => {
            warn!("recovering from malformed storage: {err}");
            Document::empty()
        }
    }
}

/// Normalizes an already-parsed document value.
pub fn normalize_value(value: &Value) -> Document {
    let user = value.get("user").and_then(normalize_user);
    let fallback_user_id = user.as_ref().map(|u| u.id.clone());

    let mut resumes: IndexMap<String, Resume> = IndexMap::new();
    if let Some(entries) = value.get("resumes").and_then(Value::as_array) {
        for entry in entries {
            let mut resume = normalize_resume(entry, fallback_user_id.as_deref());
            // Ids within `resumes` must be unique.
            if resumes.contains_key(&resume.id) {
                resume.id = defaults::new_id();
            }
            resumes.insert(resume.id.clone(), resume);
        }
    }

    Document { user, resumes }
}

/// Builds a User from a loosely-shaped value, or None when there is no
/// user object at all.
pub fn normalize_user(value: &Value) -> Option<User> {
    let obj = value.as_object()?;
    let created_at = date_or_now(obj.get("createdAt"));
    let updated_at = date_or(obj.get("updatedAt"), created_at).max(created_at);
    Some(User {
        id: nonempty_str(obj.get("id")).unwrap_or_else(defaults::new_id),
        email: nonempty_str(obj.get("email")).unwrap_or_else(|| defaults::DEFAULT_EMAIL.into()),
        name: nonempty_str(obj.get("name")).unwrap_or_else(|| "Signimus User".into()),
        username: nonempty_str(obj.get("username")).unwrap_or_else(|| "signimususer".into()),
        locale: nonempty_str(obj.get("locale")).unwrap_or_else(|| "en-US".into()),
        picture: nonempty_str(obj.get("picture")),
        provider: nonempty_str(obj.get("provider")).unwrap_or_else(|| "email".into()),
        email_verified: bool_or(obj.get("emailVerified"), false),
        two_factor_enabled: bool_or(obj.get("twoFactorEnabled"), false),
        role: nonempty_str(obj.get("role")).unwrap_or_else(|| "user".into()),
        created_at,
        updated_at,
    })
}

/// Builds a full Resume from a loosely-shaped value, applying the defaulting
/// rules field-by-field. This is the single defaulting code path shared by
/// load-time normalization, the manual fix-up routine and resume import.
pub fn normalize_resume(value: &Value, fallback_user_id: Option<&str>) -> Resume {
    let name_field = nonempty_str(value.get("name"));
    let title_field = nonempty_str(value.get("title"));
    let name = name_field
        .clone()
        .or_else(|| title_field.clone())
        .unwrap_or_else(|| UNTITLED_RESUME.to_string());
    let title = title_field
        .or(name_field)
        .unwrap_or_else(|| UNTITLED_RESUME.to_string());

    let created_at = date_or_now(value.get("createdAt"));
    let updated_at = date_or(value.get("updatedAt"), created_at).max(created_at);

    let slug = nonempty_str(value.get("slug")).unwrap_or_else(|| {
        let base = slugify(&name);
        let base = if base.is_empty() {
            "untitled"
        } else {
            base.as_str()
        };
        format!("{}-{}", base, Utc::now().timestamp_millis())
    });

    let visibility = match nonempty_str(value.get("visibility")).as_deref() {
        Some("public") => Visibility::Public,
        _ => Visibility::Private,
    };

    Resume {
        id: nonempty_str(value.get("id")).unwrap_or_else(defaults::new_id),
        user_id: nonempty_str(value.get("userId"))
            .or_else(|| fallback_user_id.map(str::to_string))
            .unwrap_or_else(|| LOCAL_USER_ID.to_string()),
        name,
        title,
        slug,
        visibility,
        locked: bool_or(value.get("locked"), false),
        created_at,
        updated_at,
        data: normalize_data(value.get("data")),
    }
}

fn normalize_data(value: Option<&Value>) -> ResumeData {
    let basics = de_or::<Basics>(value.and_then(|v| v.get("basics")));
    let sections = normalize_sections(value.and_then(|v| v.get("sections")));
    let metadata = normalize_metadata(value.and_then(|v| v.get("metadata")), &sections);
    ResumeData {
        basics,
        sections,
        metadata,
    }
}

fn normalize_sections(value: Option<&Value>) -> Sections {
    let obj = value.and_then(Value::as_object);
    let fixed = |key: &str| normalize_section(key, obj.and_then(|o| o.get(key)));

    let custom = obj
        .and_then(|o| o.get("custom"))
        .and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .map(|(id, section)| (id.clone(), normalize_custom_section(id, section)))
                .collect()
        })
        .unwrap_or_default();

    // Unknown section keys are carried through untouched.
    let extra: BTreeMap<String, Value> = obj
        .map(|o| {
            o.iter()
                .filter(|(key, _)| {
                    key.as_str() != "custom" && !defaults::SECTION_KEYS.contains(&key.as_str())
                })
                .map(|(key, section)| (key.clone(), section.clone()))
                .collect()
        })
        .unwrap_or_default();

    Sections {
        basics: fixed("basics"),
        work: fixed("work"),
        volunteer: fixed("volunteer"),
        education: fixed("education"),
        awards: fixed("awards"),
        certificates: fixed("certificates"),
        publications: fixed("publications"),
        skills: fixed("skills"),
        languages: fixed("languages"),
        interests: fixed("interests"),
        references: fixed("references"),
        projects: fixed("projects"),
        custom,
        extra,
    }
}

fn normalize_section(key: &str, value: Option<&Value>) -> Section {
    let obj = match value.and_then(Value::as_object) {
        Some(obj) => obj,
        None => return default_section(key),
    };
    Section {
        id: nonempty_str(obj.get("id")).unwrap_or_else(|| key.to_string()),
        name: nonempty_str(obj.get("name")).unwrap_or_else(|| section_display_name(key)),
        visible: bool_or(obj.get("visible"), true),
        columns: match obj.get("columns").and_then(Value::as_u64) {
            Some(columns) if columns > 0 => columns as u32,
            _ => 1,
        },
        separate_links: bool_or(obj.get("separateLinks"), true),
        items: obj
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

fn normalize_custom_section(id: &str, value: &Value) -> Section {
    let mut section = normalize_section(id, Some(value));
    if section.name == section_display_name(id) && value.get("name").is_none() {
        section.name = "Custom Section".to_string();
    }
    section
}

fn normalize_metadata(value: Option<&Value>, sections: &Sections) -> Metadata {
    let obj = value.and_then(Value::as_object);

    let mut layout: Layout = obj
        .and_then(|o| o.get("layout"))
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_else(default_layout);
    // Every layout reference must resolve to an existing section key.
    for page in layout.iter_mut() {
        for column in page.iter_mut() {
            column.retain(|key| sections.contains_key(key));
        }
    }

    let page_obj = obj.and_then(|o| o.get("page")).and_then(Value::as_object);
    let page = Page {
        margin: page_obj
            .and_then(|o| o.get("margin"))
            .and_then(Value::as_f64)
            .unwrap_or(24.5),
        format: nonempty_str(page_obj.and_then(|o| o.get("format")))
            .map(|f| f.to_lowercase())
            .unwrap_or_else(|| DEFAULT_PAGE_FORMAT.to_string()),
        options: de_or::<PageOptions>(page_obj.and_then(|o| o.get("options"))),
    };

    Metadata {
        layout,
        page,
        template: nonempty_str(obj.and_then(|o| o.get("template")))
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
        theme: de_or::<Theme>(obj.and_then(|o| o.get("theme"))),
        css: de_or::<Css>(obj.and_then(|o| o.get("css"))),
        typography: de_or::<Typography>(obj.and_then(|o| o.get("typography"))),
        notes: nonempty_str(obj.and_then(|o| o.get("notes"))).unwrap_or_default(),
    }
}

fn de_or<T: Default + DeserializeOwned>(value: Option<&Value>) -> T {
    value
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

fn nonempty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn bool_or(value: Option<&Value>, default: bool) -> bool {
    value.and_then(Value::as_bool).unwrap_or(default)
}

fn date_or_now(value: Option<&Value>) -> DateTime<Utc> {
    date_or(value, Utc::now())
}

fn date_or(value: Option<&Value>, default: DateTime<Utc>) -> DateTime<Utc> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(default)
}
