//! Default-document factory — schema-complete default user, resume and
//! section objects. Pure construction, no I/O.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    Basics, Css, Layout, Metadata, Page, Resume, ResumeData, Section, Sections, Theme, Typography,
    User, Visibility,
};

/// The fixed section keys, in seed-layout order.
pub const SECTION_KEYS: [&str; 12] = [
    "basics",
    "work",
    "volunteer",
    "education",
    "awards",
    "certificates",
    "publications",
    "skills",
    "languages",
    "interests",
    "references",
    "projects",
];

pub const DEFAULT_TEMPLATE: &str = "catalyst";
pub const DEFAULT_PAGE_FORMAT: &str = "a4";
pub const UNTITLED_RESUME: &str = "Untitled Resume";
pub const DEFAULT_EMAIL: &str = "user@signimus.com";
pub const LOCAL_USER_ID: &str = "local-user";

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn default_user() -> User {
    let now = Utc::now();
    User {
        id: new_id(),
        email: DEFAULT_EMAIL.to_string(),
        name: "Signimus User".to_string(),
        username: "signimususer".to_string(),
        locale: "en-US".to_string(),
        picture: None,
        provider: "email".to_string(),
        email_verified: false,
        two_factor_enabled: false,
        role: "user".to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// Display name for a section key: `work` → `Work`.
pub fn section_display_name(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().to_string() + chars.as_str(),
    }
}

pub fn default_section(key: &str) -> Section {
    Section {
        id: key.to_string(),
        name: section_display_name(key),
        visible: true,
        columns: 1,
        separate_links: true,
        items: Vec::new(),
    }
}

pub fn default_sections() -> Sections {
    Sections {
        basics: default_section("basics"),
        work: default_section("work"),
        volunteer: default_section("volunteer"),
        education: default_section("education"),
        awards: default_section("awards"),
        certificates: default_section("certificates"),
        publications: default_section("publications"),
        skills: default_section("skills"),
        languages: default_section("languages"),
        interests: default_section("interests"),
        references: default_section("references"),
        projects: default_section("projects"),
        custom: BTreeMap::new(),
        extra: BTreeMap::new(),
    }
}

/// Seed layout: two pages covering exactly the twelve fixed section keys.
pub fn default_layout() -> Layout {
    vec![
        vec![
            vec!["basics".to_string()],
            vec!["work".to_string()],
            vec!["education".to_string()],
            vec!["projects".to_string()],
            vec!["skills".to_string()],
            vec!["languages".to_string()],
            vec!["interests".to_string()],
        ],
        vec![
            vec!["awards".to_string()],
            vec!["certificates".to_string()],
            vec!["publications".to_string()],
            vec!["volunteer".to_string()],
            vec!["references".to_string()],
        ],
    ]
}

pub fn default_metadata() -> Metadata {
    Metadata {
        layout: default_layout(),
        page: Page::default(),
        template: DEFAULT_TEMPLATE.to_string(),
        theme: Theme::default(),
        css: Css {
            value: String::new(),
            visible: false,
        },
        typography: Typography::default(),
        notes: String::new(),
    }
}

pub fn default_resume_data() -> ResumeData {
    ResumeData {
        basics: Basics::default(),
        sections: default_sections(),
        metadata: default_metadata(),
    }
}

/// A schema-complete resume owned by `user_id`, with a slug derived from the
/// name plus the creation timestamp to reduce collision probability.
pub fn default_resume(user_id: &str, name: Option<&str>) -> Resume {
    let now = Utc::now();
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(UNTITLED_RESUME);
    let slug_base = crate::models::resume::slugify(name);
    let slug_base = if slug_base.is_empty() {
        "untitled".to_string()
    } else {
        slug_base
    };
    Resume {
        id: new_id(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        title: name.to_string(),
        slug: format!("{}-{}", slug_base, now.timestamp_millis()),
        visibility: Visibility::Private,
        locked: false,
        created_at: now,
        updated_at: now,
        data: default_resume_data(),
    }
}
