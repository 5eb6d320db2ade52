//! Post draft built up field by field before submission.
//!
//! The draft is an open mapping: the form writes `title`, `category`,
//! `content` and `image`, but any other key is carried through to the
//! backend unchanged. Validation is left to the server.

#[cfg(test)]
#[path = "draft_test.rs"]
mod draft_test;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

pub const TITLE_FIELD: &str = "title";
pub const CATEGORY_FIELD: &str = "category";
pub const CONTENT_FIELD: &str = "content";
pub const IMAGE_FIELD: &str = "image";

/// Categories offered by the post form; the first is the unselected default.
pub const CATEGORIES: [(&str, &str); 4] = [
    ("uncategorized", "Select a category"),
    ("javascript", "JavaScript"),
    ("reactjs", "React.js"),
    ("nextjs", "Next.js"),
];

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Draft {
    fields: BTreeMap<String, Value>,
}

impl Draft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a form field, replacing any previous value.
    ///
    /// `image` is reserved for completed uploads; writes to it are ignored
    /// and reported as `false`.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> bool {
        let field = field.into();
        if field == IMAGE_FIELD {
            tracing::warn!("ignoring direct write to draft image");
            return false;
        }
        self.fields.insert(field, value.into());
        true
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// A field's value when it is a string.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn set_title(&mut self, title: &str) {
        self.fields.insert(TITLE_FIELD.to_owned(), title.into());
    }

    pub fn set_category(&mut self, category: &str) {
        self.fields.insert(CATEGORY_FIELD.to_owned(), category.into());
    }

    pub fn set_content(&mut self, content: &str) {
        self.fields.insert(CONTENT_FIELD.to_owned(), content.into());
    }

    /// Image URL, present only after a completed upload.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.get_str(IMAGE_FIELD)
    }

    /// Only the upload flow writes this field.
    pub(crate) fn set_image(&mut self, url: &str) {
        self.fields.insert(IMAGE_FIELD.to_owned(), url.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
