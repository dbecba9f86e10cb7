use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};

/// How a document coordinate is spelled in content API paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PathStyle {
    /// `/content/{language}/{section}-{subsection}`
    #[default]
    Dashed,
    /// `/content/{language}/{section}/{subsection}`
    Nested,
}

/// One document: `(language, section, subsection)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentCoordinate {
    pub language: String,
    pub section_id: String,
    pub subsection_id: String,
}

impl ContentCoordinate {
    pub fn new(
        language: impl Into<String>,
        section_id: impl Into<String>,
        subsection_id: impl Into<String>,
    ) -> Result<Self> {
        let coordinate = Self {
            language: language.into(),
            section_id: section_id.into(),
            subsection_id: subsection_id.into(),
        };
        for (name, value) in [
            ("language", &coordinate.language),
            ("section id", &coordinate.section_id),
            ("subsection id", &coordinate.subsection_id),
        ] {
            validate_segment(name, value)?;
        }
        Ok(coordinate)
    }

    /// Parses a page URL of the form `section/subsection`; surrounding
    /// slashes are ignored.
    pub fn from_page_url(language: &str, page_url: &str) -> Result<Self> {
        let parts = page_url
            .split('/')
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>();
        let [section_id, subsection_id] = parts.as_slice() else {
            return Err(PortalError::Validation(format!(
                "page url must look like section/subsection: {page_url:?}"
            )));
        };
        Self::new(language, *section_id, *subsection_id)
    }

    /// Key the content store files documents under.
    pub fn content_id(&self) -> String {
        format!("{}-{}", self.section_id, self.subsection_id)
    }

    pub fn page_url(&self) -> String {
        format!("{}/{}", self.section_id, self.subsection_id)
    }

    /// Path below the API base, without a leading slash.
    pub fn api_path(&self, style: PathStyle) -> String {
        match style {
            PathStyle::Dashed => format!("content/{}/{}", self.language, self.content_id()),
            PathStyle::Nested => format!(
                "content/{}/{}/{}",
                self.language, self.section_id, self.subsection_id
            ),
        }
    }
}

impl fmt::Display for ContentCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.language, self.section_id, self.subsection_id
        )
    }
}

pub(crate) fn validate_segment(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PortalError::Validation(format!("{name} is empty")));
    }
    if value == "." || value == ".." || value.contains(['/', '\\', '?', '#']) {
        return Err(PortalError::Validation(format!(
            "{name} must be a single path segment: {value:?}"
        )));
    }
    Ok(())
}
