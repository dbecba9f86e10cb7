use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOfContentHeader {
    pub id: String,
    pub title: String,
    pub level: u8,
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOfContentData {
    pub headers: Vec<TableOfContentHeader>,
    pub structure: BTreeMap<String, TableOfContentHeader>,
}

impl TableOfContentData {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// Body of `GET /content/{language}/{section}-{subsection}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContentResponse {
    pub page_content: String,
    #[serde(default)]
    pub table_of_content: Option<TableOfContentData>,
}

/// Body of `POST /content/{language}/{section}-{subsection}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContentCreate {
    #[serde(rename = "pageContent")]
    pub page_content: String,
    #[serde(rename = "pageURL")]
    pub page_url: String,
    #[serde(rename = "tableOfContent", default)]
    pub table_of_content: Option<TableOfContentData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStructure {
    #[serde(default)]
    pub sections: IndexMap<String, Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub subsections: IndexMap<String, Subsection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsection {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsubsections: Option<IndexMap<String, Subsubsection>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsubsection {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSectionRequest {
    pub section_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSubsectionRequest {
    pub section_id: String,
    pub subsection_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebContentRequest {
    pub url: String,
    pub section_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebContentResponse {
    pub status: String,
    pub structure: DocumentStructure,
}
