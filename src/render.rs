use pulldown_cmark::{CowStr, Event, Tag};

use crate::context::Breadcrumb;
use crate::formats::TableOfContentData;
use crate::structure::SidebarSection;
use crate::toc::{CollisionPolicy, build_toc, markdown_parser, toc_headings};

/// Markdown to an HTML fragment plus the TOC derived from the same parse.
/// Level 1-3 headings get `id` attributes equal to their TOC ids, so every
/// TOC entry has a matching element.
pub fn render_markdown_with_toc(
    markdown: &str,
    collisions: CollisionPolicy,
) -> (String, TableOfContentData) {
    let mut events = markdown_parser(markdown).collect::<Vec<_>>();

    let headings = toc_headings(&events);
    let starts = headings.iter().map(|(start, _, _)| *start).collect::<Vec<_>>();
    let toc = build_toc(
        headings.into_iter().map(|(_, level, title)| (level, title)),
        collisions,
    );

    for (start, header) in starts.into_iter().zip(&toc.headers) {
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[start] {
            *id = Some(CowStr::from(header.id.clone()));
        }
    }

    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, events.into_iter());
    (html, toc)
}

/// Nested `<ul>` following heading levels. The entry whose id is `active`
/// carries `class="active"`.
pub fn render_toc_html(toc: &TableOfContentData, active: Option<&str>) -> String {
    let mut out = String::new();
    let mut open: Vec<u8> = Vec::new();

    for header in &toc.headers {
        while open.last().is_some_and(|top| *top > header.level) {
            out.push_str("</li></ul>");
            open.pop();
        }
        match open.last() {
            Some(top) if *top == header.level => out.push_str("</li>"),
            _ => {
                out.push_str("<ul>");
                open.push(header.level);
            }
        }

        let class = if active == Some(header.id.as_str()) {
            " class=\"active\""
        } else {
            ""
        };
        out.push_str(&format!(
            "<li><a href=\"#{}\"{class}>{}</a>",
            html_escape(&header.id),
            html_escape(&header.title)
        ));
    }

    for _ in open {
        out.push_str("</li></ul>");
    }
    out
}

/// Section navigation; `current` is the page path (`section/subsection`).
pub fn render_sidebar_html(
    language: &str,
    sections: &[SidebarSection],
    current: Option<&str>,
) -> String {
    let mut out = String::new();
    for section in sections {
        out.push_str(&format!(
            "<section><h3>{}</h3><ul>",
            html_escape(&section.title)
        ));
        for entry in &section.subsections {
            let path = format!("{}/{}", section.id, entry.id);
            let class = if current == Some(path.as_str()) {
                " class=\"current\""
            } else {
                ""
            };
            out.push_str(&format!(
                "<li><a href=\"/docs/{}/{}\"{class}>{}</a></li>",
                html_escape(language),
                html_escape(&path),
                html_escape(&entry.title)
            ));
        }
        out.push_str("</ul></section>");
    }
    out
}

/// Full HTML document: breadcrumbs, section navigation, the rendered page,
/// and the TOC sidebar. Empty parts are left out.
pub fn render_page_html(
    title: &str,
    lang: &str,
    breadcrumbs: &[Breadcrumb],
    sidebar_html: &str,
    content_html: &str,
    toc_html: &str,
) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n");
    out.push_str(&format!("<html lang=\"{}\">\n", html_escape(lang)));
    out.push_str("<head>\n");
    out.push_str("  <meta charset=\"utf-8\" />\n");
    out.push_str(&format!("  <title>{}</title>\n", html_escape(title)));
    out.push_str("</head>\n");
    out.push_str("<body>\n");

    if !breadcrumbs.is_empty() {
        out.push_str("<nav class=\"breadcrumbs\"><ol>");
        for crumb in breadcrumbs {
            out.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>",
                html_escape(&crumb.path),
                html_escape(&crumb.label)
            ));
        }
        out.push_str("</ol></nav>\n");
    }

    if !sidebar_html.is_empty() {
        out.push_str("<nav class=\"sidebar\">\n");
        out.push_str(sidebar_html);
        out.push_str("\n</nav>\n");
    }

    out.push_str("<main class=\"content\">\n");
    out.push_str(content_html);
    if !content_html.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("</main>\n");

    if !toc_html.is_empty() {
        out.push_str("<aside class=\"toc\">\n");
        out.push_str("<h2>On this page</h2>\n");
        out.push_str(toc_html);
        out.push_str("\n</aside>\n");
    }

    out.push_str("</body>\n");
    out.push_str("</html>\n");
    out
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
