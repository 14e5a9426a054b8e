pub mod resume;
pub mod user;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use resume::{
    remove_item_in_layout, Basics, Css, Font, Layout, Metadata, MetadataPatch, Page, PageOptions,
    PagePatch, Resume, ResumeData, ResumeDataPatch, ResumePatch, Section, Sections, Theme,
    Typography, Url, Visibility,
};
pub use user::{AuthPayload, MessagePayload, User, UserPatch};

use crate::defaults;

/// The single persisted `{ user, resumes }` structure — the sole unit of truth.
/// Resumes are indexed by id in memory for O(1) lookups but keep their order
/// and serialize as the plain `resumes` array the wire format requires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub user: Option<User>,
    #[serde(with = "resume_seq")]
    pub resumes: IndexMap<String, Resume>,
}

impl Document {
    /// Recovery shape for unparseable storage.
    pub fn empty() -> Self {
        Document {
            user: None,
            resumes: IndexMap::new(),
        }
    }

    /// First-access seed: a default user and no resumes.
    pub fn seeded() -> Self {
        Document {
            user: Some(defaults::default_user()),
            resumes: IndexMap::new(),
        }
    }

    pub fn insert_resume(&mut self, resume: Resume) {
        self.resumes.insert(resume.id.clone(), resume);
    }
}

/// Serializes the id-indexed resume map as the ordered `resumes` array of
/// the persisted document, and rebuilds the index on the way in.
mod resume_seq {
    use super::Resume;
    use indexmap::IndexMap;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        map: &IndexMap<String, Resume>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(map.len()))?;
        for resume in map.values() {
            seq.serialize_element(resume)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<IndexMap<String, Resume>, D::Error> {
        let entries = Vec::<Resume>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|resume| (resume.id.clone(), resume))
            .collect())
    }
}
