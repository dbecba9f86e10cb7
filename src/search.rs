//! Title search over the documentation tree.
//!
//! Every section, subsection and sub-subsection becomes one flat record; a
//! query matches a record when some substring of its title is within an edit
//! distance of `threshold * query length` of the query (case-insensitive).

use serde::Serialize;

use crate::formats::DocumentStructure;

/// Share of the query that may be mistyped and still match.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsection_id: Option<String>,
}

impl SearchRecord {
    /// Link target: sections and subsections are pages, sub-subsections are
    /// anchors inside their subsection's page.
    pub fn href(&self) -> String {
        match (&self.section_id, &self.subsection_id) {
            (Some(section), Some(subsection)) => format!("/{section}/{subsection}#{}", self.id),
            (Some(section), None) => format!("/{section}/{}", self.id),
            _ => format!("/{}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit<'a> {
    #[serde(flatten)]
    pub record: &'a SearchRecord,
    pub href: String,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct SearchIndex {
    records: Vec<SearchRecord>,
    threshold: f64,
}

impl SearchIndex {
    pub fn from_structure(structure: &DocumentStructure) -> Self {
        let mut records = Vec::new();
        for (section_id, section) in &structure.sections {
            records.push(SearchRecord {
                id: section_id.clone(),
                title: section.title.clone(),
                parent_title: None,
                section_id: None,
                subsection_id: None,
            });
            for (subsection_id, subsection) in &section.subsections {
                records.push(SearchRecord {
                    id: subsection_id.clone(),
                    title: subsection.title.clone(),
                    parent_title: Some(section.title.clone()),
                    section_id: Some(section_id.clone()),
                    subsection_id: None,
                });
                for (id, subsub) in subsection.subsubsections.iter().flatten() {
                    records.push(SearchRecord {
                        id: id.clone(),
                        title: subsub.title.clone(),
                        parent_title: Some(subsection.title.clone()),
                        section_id: Some(section_id.clone()),
                        subsection_id: Some(subsection_id.clone()),
                    });
                }
            }
        }

        Self {
            records,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn records(&self) -> &[SearchRecord] {
        &self.records
    }

    /// Best matches first; ties keep index order. Blank queries match nothing.
    pub fn search(&self, query: &str) -> Vec<SearchHit<'_>> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let mut hits = self
            .records
            .iter()
            .filter_map(|record| {
                let score = fuzzy_score(query, &record.title)?;
                (score <= self.threshold).then(|| SearchHit {
                    record,
                    href: record.href(),
                    score,
                })
            })
            .collect::<Vec<_>>();
        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits
    }
}

/// Fewest edits turning `pattern` into some substring of `text`, divided by
/// the pattern length. `0.0` is an exact substring match.
pub fn fuzzy_score(pattern: &str, text: &str) -> Option<f64> {
    let pattern = pattern.to_lowercase().chars().collect::<Vec<_>>();
    if pattern.is_empty() {
        return None;
    }
    let text = text.to_lowercase().chars().collect::<Vec<_>>();

    // Rows are pattern prefixes, columns text positions; row 0 is all zeros
    // so a match may start anywhere in the text.
    let mut prev = vec![0usize; text.len() + 1];
    let mut curr = vec![0usize; text.len() + 1];
    for (i, p) in pattern.iter().enumerate() {
        curr[0] = i + 1;
        for (j, t) in text.iter().enumerate() {
            let cost = usize::from(p != t);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let best = prev.iter().copied().min().unwrap_or(pattern.len());
    Some(best as f64 / pattern.len() as f64)
}
