//! Editor synchronization store — in-memory working copy of one resume with
//! bounded undo/redo history. Every edit updates memory immediately, pushes a
//! history snapshot and schedules a debounced persistence call carrying a
//! deep copy of the resulting resume.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::Method;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::api::LocalApi;
use crate::errors::AppError;
use crate::models::{remove_item_in_layout, Resume, Section, Visibility};

/// Snapshot bound for the undo/redo history.
pub const HISTORY_LIMIT: usize = 100;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Receives the debounced persistence write.
#[async_trait]
pub trait ResumeSink: Send + Sync {
    async fn persist(&self, resume: Resume) -> Result<(), AppError>;
}

/// The adapter is the natural sink: a persisted snapshot is a
/// `PATCH /resume/:id` carrying the full resume.
#[async_trait]
impl ResumeSink for LocalApi {
    async fn persist(&self, resume: Resume) -> Result<(), AppError> {
        let path = format!("/resume/{}", resume.id);
        let body = serde_json::to_value(&resume)?;
        self.dispatch(Method::PATCH, &path, Some(body)).await?;
        Ok(())
    }
}

/// Cancellable deferred write: scheduling replaces any pending task, so only
/// the last call within a quiet window reaches the sink, carrying the
/// snapshot captured at schedule time.
pub struct DebouncedSaver {
    sink: Arc<dyn ResumeSink>,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl DebouncedSaver {
    pub fn new(sink: Arc<dyn ResumeSink>, delay: Duration) -> Self {
        DebouncedSaver {
            sink,
            delay,
            pending: None,
        }
    }

    /// Restarts the trailing timer with a fresh snapshot. A previously
    /// scheduled write that has not fired yet is discarded.
    pub fn schedule(&mut self, resume: Resume) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        let sink = Arc::clone(&self.sink);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = sink.persist(resume).await {
                warn!("debounced resume write failed: {err}");
            }
        }));
    }
}

pub struct ResumeEditor {
    resume: Resume,
    history: Vec<Resume>,
    cursor: usize,
    saver: DebouncedSaver,
}

impl ResumeEditor {
    pub fn new(resume: Resume, sink: Arc<dyn ResumeSink>) -> Self {
        Self::with_debounce(resume, sink, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(resume: Resume, sink: Arc<dyn ResumeSink>, delay: Duration) -> Self {
        ResumeEditor {
            history: vec![resume.clone()],
            cursor: 0,
            resume,
            saver: DebouncedSaver::new(sink, delay),
        }
    }

    pub fn resume(&self) -> &Resume {
        &self.resume
    }

    /// Applies a structural update at a dot path inside `resume.data`
    /// (`visibility` is special-cased as a top-level field). Rejects values
    /// that would break the data shape without mutating anything.
    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), AppError> {
        if path == "visibility" {
            self.resume.visibility = serde_json::from_value::<Visibility>(value)
                .map_err(|e| AppError::Validation(e.to_string()))?;
        } else {
            let mut data = serde_json::to_value(&self.resume.data)?;
            set_at_path(&mut data, path, value);
            self.resume.data =
                serde_json::from_value(data).map_err(|e| AppError::Validation(e.to_string()))?;
        }
        self.commit();
        Ok(())
    }

    /// Generates a new custom section, appends its key to the last page's
    /// first layout column and inserts an empty section object. Returns the
    /// generated id.
    pub fn add_section(&mut self) -> String {
        let id = crate::defaults::new_id();
        let section = Section {
            id: id.clone(),
            name: "Custom Section".to_string(),
            ..Section::default()
        };

        let layout = &mut self.resume.data.metadata.layout;
        if layout.is_empty() {
            layout.push(Vec::new());
        }
        let last_page = layout.last_mut().expect("layout has at least one page");
        if last_page.is_empty() {
            last_page.push(Vec::new());
        }
        last_page[0].push(format!("custom.{id}"));

        self.resume.data.sections.custom.insert(id.clone(), section);
        self.commit();
        id
    }

    /// Removes a custom section and every layout reference to it. Keys
    /// without the `custom.` prefix are ignored.
    pub fn remove_section(&mut self, key: &str) {
        let Some(id) = key.strip_prefix("custom.") else {
            return;
        };
        remove_item_in_layout(&mut self.resume.data.metadata.layout, key);
        self.resume.data.sections.custom.remove(id);
        self.commit();
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    /// Moves the history pointer back without pushing a snapshot. The
    /// debounced persist still fires so time-travelled state survives reload.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        self.resume = self.history[self.cursor].clone();
        self.saver.schedule(self.resume.clone());
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        self.resume = self.history[self.cursor].clone();
        self.saver.schedule(self.resume.clone());
        true
    }

    fn commit(&mut self) {
        self.history.truncate(self.cursor + 1);
        self.history.push(self.resume.clone());
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.cursor = self.history.len() - 1;
        self.saver.schedule(self.resume.clone());
    }
}

/// lodash-style structural set: intermediate objects are created on demand,
/// numeric segments index into arrays (extending with nulls when needed).
fn set_at_path(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();
        if let Ok(index) = segment.parse::<usize>() {
            if !current.is_array() {
                *current = Value::Array(Vec::new());
            }
            let array = current.as_array_mut().expect("just ensured array");
            while array.len() <= index {
                array.push(Value::Null);
            }
            if last {
                array[index] = value;
                return;
            }
            current = &mut array[index];
        } else {
            if !current.is_object() {
                *current = json!({});
            }
            let object = current.as_object_mut().expect("just ensured object");
            if last {
                object.insert(segment.to_string(), value);
                return;
            }
            current = object.entry(segment.to_string()).or_insert(Value::Null);
        }
    }
}
