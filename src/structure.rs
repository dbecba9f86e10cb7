use indexmap::IndexMap;
use serde::Serialize;

use crate::context::Breadcrumb;
use crate::coordinate::{ContentCoordinate, validate_segment};
use crate::error::{PortalError, Result};
use crate::formats::{
    AddSectionRequest, AddSubsectionRequest, DocumentStructure, Section, Subsection,
};

/// Admin forms send titles as `# Title` / `## Title`; the structure keeps the
/// bare text.
pub fn strip_heading_marker(title: &str) -> &str {
    title.trim().trim_start_matches('#').trim()
}

pub fn add_section(structure: &mut DocumentStructure, request: &AddSectionRequest) -> Result<()> {
    validate_segment("section id", &request.section_id)?;
    let title = non_empty_title(&request.title)?;

    if structure.sections.contains_key(&request.section_id) {
        return Err(PortalError::Conflict(format!(
            "section {}",
            request.section_id
        )));
    }

    structure.sections.insert(
        request.section_id.clone(),
        Section {
            title: title.to_owned(),
            subsections: IndexMap::new(),
        },
    );
    tracing::info!(section_id = %request.section_id, "added section");
    Ok(())
}

pub fn add_subsection(
    structure: &mut DocumentStructure,
    request: &AddSubsectionRequest,
) -> Result<()> {
    validate_segment("subsection id", &request.subsection_id)?;
    let title = non_empty_title(&request.title)?;

    let section = structure
        .sections
        .get_mut(&request.section_id)
        .ok_or_else(|| PortalError::NotFound(format!("section {}", request.section_id)))?;
    if section.subsections.contains_key(&request.subsection_id) {
        return Err(PortalError::Conflict(format!(
            "subsection {}/{}",
            request.section_id, request.subsection_id
        )));
    }

    section.subsections.insert(
        request.subsection_id.clone(),
        Subsection {
            title: title.to_owned(),
            content: request.content.clone(),
            subsubsections: None,
        },
    );
    tracing::info!(
        section_id = %request.section_id,
        subsection_id = %request.subsection_id,
        "added subsection"
    );
    Ok(())
}

fn non_empty_title(raw: &str) -> Result<&str> {
    let title = strip_heading_marker(raw);
    if title.is_empty() {
        return Err(PortalError::Validation("title is empty".to_owned()));
    }
    Ok(title)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarSection {
    pub id: String,
    pub title: String,
    pub subsections: Vec<SidebarEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarEntry {
    pub id: String,
    pub title: String,
    pub content: String,
}

/// Flattens the structure into the ordered list the navigation sidebar shows.
pub fn sidebar(structure: &DocumentStructure) -> Vec<SidebarSection> {
    structure
        .sections
        .iter()
        .map(|(id, section)| SidebarSection {
            id: id.clone(),
            title: section.title.clone(),
            subsections: section
                .subsections
                .iter()
                .map(|(sub_id, sub)| SidebarEntry {
                    id: sub_id.clone(),
                    title: sub.title.clone(),
                    content: sub.content.clone(),
                })
                .collect(),
        })
        .collect()
}

/// `Section > Subsection` trail for a page; ids stand in for unknown titles.
pub fn breadcrumbs_for(
    structure: &DocumentStructure,
    coordinate: &ContentCoordinate,
) -> Vec<Breadcrumb> {
    let section = structure.sections.get(&coordinate.section_id);
    let section_title = section.map_or(coordinate.section_id.as_str(), |s| s.title.as_str());
    let subsection_title = section
        .and_then(|s| s.subsections.get(&coordinate.subsection_id))
        .map_or(coordinate.subsection_id.as_str(), |s| s.title.as_str());

    vec![
        Breadcrumb {
            label: section_title.to_owned(),
            path: format!("/{}", coordinate.section_id),
        },
        Breadcrumb {
            label: subsection_title.to_owned(),
            path: format!("/{}", coordinate.page_url()),
        },
    ]
}
