use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context as _;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::coordinate::ContentCoordinate;
use crate::formats::{DocumentStructure, Section, Subsection, Subsubsection};

static BUILTIN_YAML: &str = include_str!("../assets/default_docs.yaml");

static BUILTIN: LazyLock<DefaultCatalog> = LazyLock::new(|| {
    DefaultCatalog::from_yaml_str(BUILTIN_YAML).expect("embedded default_docs.yaml is valid")
});

/// Locally known documentation used whenever the content API has nothing
/// better to offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultCatalog {
    pub sections: Vec<CatalogSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subsections: Vec<CatalogSubsection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSubsection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub subsubsections: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl DefaultCatalog {
    pub fn builtin() -> &'static DefaultCatalog {
        &BUILTIN
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("parse default catalog yaml")
    }

    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("read default catalog: {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn subsection(&self, section_id: &str, subsection_id: &str) -> Option<&CatalogSubsection> {
        self.sections
            .iter()
            .find(|s| s.id == section_id)?
            .subsections
            .iter()
            .find(|s| s.id == subsection_id)
    }

    /// Markdown shown for `coordinate` when nothing else is available.
    /// Never empty: unknown pages get a title derived from the subsection id.
    pub fn default_markdown(&self, coordinate: &ContentCoordinate) -> String {
        match self.subsection(&coordinate.section_id, &coordinate.subsection_id) {
            Some(sub) if sub.content.trim().is_empty() => format!("# {}\n", sub.title),
            Some(sub) => format!("# {}\n\n{}\n", sub.title, sub.content.trim()),
            None => format!("# {}\n", title_from_id(&coordinate.subsection_id)),
        }
    }

    pub fn to_structure(&self) -> DocumentStructure {
        let sections = self
            .sections
            .iter()
            .map(|section| {
                let subsections = section
                    .subsections
                    .iter()
                    .map(|sub| {
                        let subsubsections = (!sub.subsubsections.is_empty()).then(|| {
                            sub.subsubsections
                                .iter()
                                .map(|entry| {
                                    (
                                        entry.id.clone(),
                                        Subsubsection {
                                            title: entry.title.clone(),
                                            content: entry.content.clone(),
                                        },
                                    )
                                })
                                .collect::<IndexMap<_, _>>()
                        });
                        (
                            sub.id.clone(),
                            Subsection {
                                title: sub.title.clone(),
                                content: sub.content.clone(),
                                subsubsections,
                            },
                        )
                    })
                    .collect();
                (
                    section.id.clone(),
                    Section {
                        title: section.title.clone(),
                        subsections,
                    },
                )
            })
            .collect();

        DocumentStructure { sections }
    }
}

/// `recurring-services` -> `Recurring Services`
fn title_from_id(id: &str) -> String {
    id.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = DefaultCatalog::builtin();
        assert_eq!(catalog.sections.len(), 4);
        assert!(catalog.subsection("quotes", "creating-quotes").is_some());
    }

    #[test]
    fn known_subsection_markdown_has_title_and_body() -> anyhow::Result<()> {
        let coord = ContentCoordinate::new("en", "invoices", "creating-invoices")?;
        assert_eq!(
            DefaultCatalog::builtin().default_markdown(&coord),
            "# Creating Invoices\n\nStep by step guide to create invoices\n"
        );
        Ok(())
    }

    #[test]
    fn unknown_subsection_gets_title_from_id() -> anyhow::Result<()> {
        let coord = ContentCoordinate::new("en", "billing", "late-fees_policy")?;
        assert_eq!(
            DefaultCatalog::builtin().default_markdown(&coord),
            "# Late Fees Policy\n"
        );
        Ok(())
    }

    #[test]
    fn structure_keeps_catalog_order_and_optional_subsubsections() {
        let structure = DefaultCatalog::builtin().to_structure();
        let ids = structure.sections.keys().cloned().collect::<Vec<_>>();
        assert_eq!(ids, vec!["invoices", "work-orders", "quotes", "scheduling"]);

        let scheduling = &structure.sections["scheduling"];
        assert!(scheduling.subsections["scheduling-overview"].subsubsections.is_none());
        assert!(scheduling.subsections["recurring-services"].subsubsections.is_some());
    }
}
