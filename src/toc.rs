use std::collections::{BTreeMap, HashSet};

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};

use crate::formats::{TableOfContentData, TableOfContentHeader};
use crate::slug::heading_id;

/// Deepest heading level that takes part in the table of contents.
pub const MAX_TOC_LEVEL: u8 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HeadingStrategy {
    /// Scan lines for `#`, `##` and `###` markers.
    #[default]
    Line,
    /// Walk the parsed markdown events.
    Ast,
}

/// What to do when two headings produce the same id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Both headings stay in `headers`; `structure` keeps the later one.
    #[default]
    LastWriteWins,
    /// Later headings get `-1`, `-2`, ... appended until the id is free.
    NumericSuffix,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TocOptions {
    pub strategy: HeadingStrategy,
    pub collisions: CollisionPolicy,
}

/// Derives the table of contents with the line-scan strategy and
/// last-write-wins ids.
#[must_use]
pub fn parse_headings(markdown: &str) -> TableOfContentData {
    parse_headings_with(markdown, &TocOptions::default())
}

#[must_use]
pub fn parse_headings_with(markdown: &str, options: &TocOptions) -> TableOfContentData {
    let raw = match options.strategy {
        HeadingStrategy::Line => scan_lines(markdown),
        HeadingStrategy::Ast => {
            let events = markdown_parser(markdown).collect::<Vec<_>>();
            toc_headings(&events)
                .into_iter()
                .map(|(_, level, title)| (level, title))
                .collect()
        }
    };
    build_toc(raw, options.collisions)
}

pub(crate) fn build_toc(
    raw: impl IntoIterator<Item = (u8, String)>,
    collisions: CollisionPolicy,
) -> TableOfContentData {
    let mut builder = TocBuilder::new(collisions);
    for (level, title) in raw {
        builder.push(level, title);
    }
    builder.finish()
}

fn scan_lines(markdown: &str) -> Vec<(u8, String)> {
    markdown
        .lines()
        .filter_map(|line| {
            let (level, title) = line_heading(line)?;
            Some((level, title.to_owned()))
        })
        .collect()
}

/// `# Title` style heading at column 0, levels 1..=3 only.
fn line_heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > usize::from(MAX_TOC_LEVEL) {
        return None;
    }

    let rest = &line[hashes..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }

    let title = rest.trim();
    if title.is_empty() {
        return None;
    }

    // Bounded by MAX_TOC_LEVEL above.
    Some((hashes as u8, title))
}

pub(crate) fn markdown_parser(markdown: &str) -> Parser<'_> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    Parser::new_ext(markdown, options)
}

/// Headings that enter the TOC as `(index of the Start event, level, title)`.
/// The title is the literal text and inline code of the heading.
pub(crate) fn toc_headings(events: &[Event<'_>]) -> Vec<(usize, u8, String)> {
    let mut out = Vec::new();
    let mut current: Option<(usize, u8, String)> = None;

    for (index, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((index, *level as u8, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, title)) = current.as_mut() {
                    title.push_str(text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some((_, _, title)) = current.as_mut() {
                    title.push(' ');
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((start, level, title)) = current.take() {
                    let title = title.trim();
                    if level <= MAX_TOC_LEVEL && !title.is_empty() {
                        out.push((start, level, title.to_owned()));
                    }
                }
            }
            _ => {}
        }
    }

    out
}

/// Assembles headings in document order and links children to the nearest
/// open ancestor one level up.
struct TocBuilder {
    collisions: CollisionPolicy,
    headers: Vec<TableOfContentHeader>,
    taken: HashSet<String>,
    current_h1: Option<usize>,
    current_h2: Option<usize>,
}

impl TocBuilder {
    fn new(collisions: CollisionPolicy) -> Self {
        Self {
            collisions,
            headers: Vec::new(),
            taken: HashSet::new(),
            current_h1: None,
            current_h2: None,
        }
    }

    fn push(&mut self, level: u8, title: String) {
        let id = self.assign_id(heading_id(&title));
        let index = self.headers.len();

        let parent = match level {
            1 => {
                self.current_h1 = Some(index);
                self.current_h2 = None;
                None
            }
            2 => {
                self.current_h2 = Some(index);
                self.current_h1
            }
            3 => self.current_h2,
            _ => return,
        };

        if let Some(parent) = parent {
            self.headers[parent].children.push(id.clone());
        }

        self.headers.push(TableOfContentHeader {
            id,
            title,
            level,
            children: Vec::new(),
        });
    }

    fn assign_id(&mut self, base: String) -> String {
        let id = match self.collisions {
            CollisionPolicy::LastWriteWins => base,
            CollisionPolicy::NumericSuffix => {
                if self.taken.contains(&base) {
                    let mut n = 1usize;
                    loop {
                        let candidate = format!("{base}-{n}");
                        if !self.taken.contains(&candidate) {
                            break candidate;
                        }
                        n += 1;
                    }
                } else {
                    base
                }
            }
        };

        if !self.taken.insert(id.clone()) {
            tracing::debug!(id = %id, "duplicate heading id; structure keeps the last occurrence");
        }
        id
    }

    fn finish(self) -> TableOfContentData {
        let mut structure = BTreeMap::new();
        for header in &self.headers {
            structure.insert(header.id.clone(), header.clone());
        }

        TableOfContentData {
            headers: self.headers,
            structure,
        }
    }
}
