use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::defaults::{DEFAULT_PAGE_FORMAT, DEFAULT_TEMPLATE, UNTITLED_RESUME};

/// Pages → columns → ordered section-key references. Order is significant;
/// the core otherwise treats it as opaque.
pub type Layout = Vec<Vec<Vec<String>>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub title: String,
    pub slug: String,
    pub visibility: Visibility,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data: ResumeData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResumeData {
    pub basics: Basics,
    pub sections: Sections,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Basics {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub url: Url,
    pub location: String,
    pub headline: String,
    pub summary: String,
    pub image: String,
    pub profiles: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Url {
    pub href: String,
    pub label: String,
}

/// A named, orderable group of resume items. Item shape varies by section
/// kind, so items stay opaque JSON values (id-keyed by convention).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Section {
    pub id: String,
    pub name: String,
    pub visible: bool,
    pub columns: u32,
    pub separate_links: bool,
    pub items: Vec<Value>,
}

impl Default for Section {
    fn default() -> Self {
        Section {
            id: String::new(),
            name: String::new(),
            visible: true,
            columns: 1,
            separate_links: true,
            items: Vec::new(),
        }
    }
}

/// The fixed section keys plus the open-ended `custom` bucket. Unknown keys
/// land in `extra` and are carried through serialization untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Sections {
    pub basics: Section,
    pub work: Section,
    pub volunteer: Section,
    pub education: Section,
    pub awards: Section,
    pub certificates: Section,
    pub publications: Section,
    pub skills: Section,
    pub languages: Section,
    pub interests: Section,
    pub references: Section,
    pub projects: Section,
    pub custom: BTreeMap<String, Section>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Sections {
    pub fn fixed(&self, key: &str) -> Option<&Section> {
        match key {
            "basics" => Some(&self.basics),
            "work" => Some(&self.work),
            "volunteer" => Some(&self.volunteer),
            "education" => Some(&self.education),
            "awards" => Some(&self.awards),
            "certificates" => Some(&self.certificates),
            "publications" => Some(&self.publications),
            "skills" => Some(&self.skills),
            "languages" => Some(&self.languages),
            "interests" => Some(&self.interests),
            "references" => Some(&self.references),
            "projects" => Some(&self.projects),
            _ => None,
        }
    }

    /// Whether a layout reference resolves to an existing section key,
    /// including `custom.<id>` keys and preserved unknown keys.
    pub fn contains_key(&self, key: &str) -> bool {
        if self.fixed(key).is_some() {
            return true;
        }
        if let Some(id) = key.strip_prefix("custom.") {
            return self.custom.contains_key(id);
        }
        self.extra.contains_key(key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub layout: Layout,
    pub page: Page,
    pub template: String,
    pub theme: Theme,
    pub css: Css,
    pub typography: Typography,
    pub notes: String,
}

impl Default for Metadata {
    fn default() -> Self {
        crate::defaults::default_metadata()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub margin: f64,
    pub format: String,
    pub options: PageOptions,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            margin: 24.5,
            format: DEFAULT_PAGE_FORMAT.to_string(),
            options: PageOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageOptions {
    pub break_line: bool,
    pub page_numbers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Theme {
    pub background: String,
    pub text: String,
    pub primary: String,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: "#1e293b".to_string(),
            text: "#1e293b".to_string(),
            primary: "#22c55e".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Css {
    pub value: String,
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Typography {
    pub font: Font,
    pub line_height: f64,
    pub hide_icons: bool,
    pub underline_links: bool,
}

impl Default for Typography {
    fn default() -> Self {
        Typography {
            font: Font::default(),
            line_height: 1.5,
            hide_icons: false,
            underline_links: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Font {
    pub family: String,
    pub subset: String,
    pub variants: Vec<String>,
    pub size: f64,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            family: "IBM Plex Sans".to_string(),
            subset: "latin".to_string(),
            variants: vec!["regular".to_string()],
            size: 14.0,
        }
    }
}

/// Typed merge input for `PATCH /resume/:id`. `id`, `userId` and `createdAt`
/// are deliberately absent — they are immutable after creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumePatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub visibility: Option<Visibility>,
    pub locked: Option<bool>,
    pub data: Option<ResumeDataPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResumeDataPatch {
    pub basics: Option<Basics>,
    pub sections: Option<Sections>,
    pub metadata: Option<MetadataPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataPatch {
    pub layout: Option<Layout>,
    pub page: Option<PagePatch>,
    pub template: Option<String>,
    pub theme: Option<Theme>,
    pub css: Option<Css>,
    pub typography: Option<Typography>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PagePatch {
    pub margin: Option<f64>,
    pub format: Option<String>,
    pub options: Option<PageOptions>,
}

impl Resume {
    /// Merges a patch preferring patch values but preserving omitted fields.
    /// `basics` and `sections` are replaced wholesale when present; metadata
    /// and page merge field-by-field; `page.format` is lower-cased on write;
    /// `updatedAt` is stamped to now.
    pub fn apply_patch(&mut self, patch: ResumePatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(title) = patch.title.or(patch.name) {
            self.title = title;
        } else if self.title.is_empty() {
            self.title = if self.name.is_empty() {
                UNTITLED_RESUME.to_string()
            } else {
                self.name.clone()
            };
        }
        if let Some(slug) = patch.slug {
            self.slug = slug;
        }
        if let Some(visibility) = patch.visibility {
            self.visibility = visibility;
        }
        if let Some(locked) = patch.locked {
            self.locked = locked;
        }
        if let Some(data) = patch.data {
            if let Some(basics) = data.basics {
                self.data.basics = basics;
            }
            if let Some(sections) = data.sections {
                self.data.sections = sections;
            }
            if let Some(metadata) = data.metadata {
                let current = &mut self.data.metadata;
                if let Some(layout) = metadata.layout {
                    current.layout = layout;
                }
                if let Some(page) = metadata.page {
                    if let Some(margin) = page.margin {
                        current.page.margin = margin;
                    }
                    if let Some(format) = page.format {
                        current.page.format = format.to_lowercase();
                    }
                    if let Some(options) = page.options {
                        current.page.options = options;
                    }
                    if current.page.format.is_empty() {
                        current.page.format = DEFAULT_PAGE_FORMAT.to_string();
                    }
                }
                if let Some(template) = metadata.template {
                    current.template = template;
                }
                if current.template.is_empty() {
                    current.template = DEFAULT_TEMPLATE.to_string();
                }
                if let Some(theme) = metadata.theme {
                    current.theme = theme;
                }
                if let Some(css) = metadata.css {
                    current.css = css;
                }
                if let Some(typography) = metadata.typography {
                    current.typography = typography;
                }
                if let Some(notes) = metadata.notes {
                    current.notes = notes;
                }
            }
        }
        self.updated_at = Utc::now();
    }
}

/// Removes every reference to `key` from every page and column of the layout.
pub fn remove_item_in_layout(layout: &mut Layout, key: &str) {
    for page in layout.iter_mut() {
        for column in page.iter_mut() {
            column.retain(|item| item != key);
        }
    }
}

/// Lower-cased, hyphen-separated form of a resume name for slug derivation.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
