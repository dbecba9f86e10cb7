use serde::Serialize;

use crate::error::{PortalError, Result};
use crate::formats::TableOfContentData;

/// Height of the fixed page header; scroll targets land below it.
pub const HEADER_OFFSET_PX: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollTarget {
    pub fragment: String,
    pub offset_px: u32,
}

/// Which TOC entry is highlighted while the reader scrolls.
#[derive(Debug, Clone, Default)]
pub struct ActiveHeadingTracker {
    ids: Vec<String>,
    active: Option<String>,
}

impl ActiveHeadingTracker {
    pub fn new(toc: &TableOfContentData) -> Self {
        Self {
            ids: toc.headers.iter().map(|h| h.id.clone()).collect(),
            active: None,
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Feeds one viewport observation. Headings leaving the viewport do not
    /// clear the highlight; the last one seen entering keeps it.
    pub fn observe(&mut self, id: &str, intersecting: bool) {
        if !intersecting {
            return;
        }
        if !self.ids.iter().any(|known| known == id) {
            tracing::debug!(id, "observation for unknown heading ignored");
            return;
        }
        self.active = Some(id.to_owned());
    }

    /// A click on a TOC entry.
    pub fn select(&mut self, id: &str) -> Result<ScrollTarget> {
        if !self.ids.iter().any(|known| known == id) {
            return Err(PortalError::NotFound(format!("heading {id}")));
        }
        self.active = Some(id.to_owned());
        Ok(ScrollTarget {
            fragment: format!("#{id}"),
            offset_px: HEADER_OFFSET_PX,
        })
    }
}
