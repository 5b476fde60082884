//! HTML output for parsed blocks.
//!
//! Headings, paragraphs, code and lists are mapped onto CommonMark events and
//! written by `pulldown_cmark::html`; images, tables and errors carry
//! attributes CommonMark can't express and are written as escaped HTML
//! fragments. Unknown block types render as a visible error.
//!
//! Image `width` and `height` given as bare digits are treated as pixels
//! (`320` becomes `320px`); any other value, such as `50%` or `12em`, is used
//! as written.

pub mod reference;

use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Tag, TagEnd, html};

use crate::block::content::{ListItems, TableSpec};
use crate::block::{Block, BlockKind, CallBlock};

/// Render a whole parse result.
pub fn to_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        html::push_html(&mut out, block_events(block).into_iter());
    }
    out
}

/// The event stream for one block.
pub fn block_events(block: &Block) -> Vec<Event<'static>> {
    let call = match block {
        Block::Call(call) => call,
        Block::Error(err) => return error_events(&err.message),
    };
    match call.builtin_kind() {
        Some(BlockKind::Head) => head_events(call),
        Some(BlockKind::Paragraph) => paragraph_events(call),
        Some(BlockKind::Code) => code_events(call),
        Some(BlockKind::List) => list_events(call),
        Some(BlockKind::Image) => vec![Event::Html(image_html(call).into())],
        Some(BlockKind::Table) => vec![Event::Html(table_html(&TableSpec::from_params(&call.params)).into())],
        None => error_events(&format!("unknown block type: {}", call.kind)),
    }
}

fn text(s: impl Into<String>) -> Event<'static> {
    Event::Text(CowStr::from(s.into()))
}

fn param_text(call: &CallBlock, name: &str) -> String {
    call.text(name).unwrap_or_default()
}

fn heading_level(call: &CallBlock) -> HeadingLevel {
    let rank = call
        .text("rank")
        .and_then(|r| r.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, 6);
    HeadingLevel::try_from(rank).unwrap_or(HeadingLevel::H1)
}

fn head_events(call: &CallBlock) -> Vec<Event<'static>> {
    let level = heading_level(call);
    vec![
        Event::Start(Tag::Heading {
            level,
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
        }),
        text(param_text(call, "text")),
        Event::End(TagEnd::Heading(level)),
    ]
}

fn paragraph_events(call: &CallBlock) -> Vec<Event<'static>> {
    vec![
        Event::Start(Tag::Paragraph),
        text(param_text(call, "text")),
        Event::End(TagEnd::Paragraph),
    ]
}

fn code_events(call: &CallBlock) -> Vec<Event<'static>> {
    let language = param_text(call, "language");
    let title = param_text(call, "title");
    let mut events = Vec::new();
    if !title.is_empty() {
        let label = if language.is_empty() {
            title
        } else {
            format!("{} ({})", title, language)
        };
        events.push(Event::Html(
            format!("<div class=\"code-title\">{}</div>\n", encode_text(&label)).into(),
        ));
    }
    let mut code = param_text(call, "text");
    if !code.ends_with('\n') {
        code.push('\n');
    }
    events.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(language.into()))));
    events.push(text(code));
    events.push(Event::End(TagEnd::CodeBlock));
    events
}

fn list_events(call: &CallBlock) -> Vec<Event<'static>> {
    let list = ListItems::from_params(&call.params);
    let mut events = vec![Event::Start(Tag::List(list.ordered.then_some(1)))];
    for item in list.items {
        events.push(Event::Start(Tag::Item));
        events.push(text(item));
        events.push(Event::End(TagEnd::Item));
    }
    events.push(Event::End(TagEnd::List(list.ordered)));
    events
}

/// Bare numbers are pixels; anything else is passed through as a CSS length.
fn css_length(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        format!("{}px", value)
    } else {
        value.to_string()
    }
}

fn image_html(call: &CallBlock) -> String {
    let mut style = Vec::new();
    for (param, property) in [("width", "width"), ("height", "height")] {
        if let Some(value) = call.text(param).filter(|v| !v.is_empty()) {
            style.push(format!("{}: {}", property, css_length(&value)));
        }
    }
    let style = if style.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", encode_double_quoted_attribute(&style.join("; ")))
    };
    format!(
        "<div class=\"func-image\"><img src=\"{}\" alt=\"{}\"{} /></div>\n",
        encode_double_quoted_attribute(&param_text(call, "src")),
        encode_double_quoted_attribute(&param_text(call, "alt")),
        style
    )
}

fn table_html(table: &TableSpec) -> String {
    let row_html = |cells: &[String], tag: &str| {
        let mut row = String::from("<tr>");
        for (i, cell) in cells.iter().enumerate() {
            match table.alignment(i).css() {
                Some(align) => row.push_str(&format!("<{} style=\"text-align: {}\">", tag, align)),
                None => row.push_str(&format!("<{}>", tag)),
            }
            row.push_str(&encode_text(cell));
            row.push_str(&format!("</{}>", tag));
        }
        row.push_str("</tr>\n");
        row
    };

    let mut out = String::from("<table class=\"func-table\">\n");
    if let Some(header) = table.header_row() {
        out.push_str("<thead>");
        out.push_str(&row_html(header, "th"));
        out.push_str("</thead>\n");
    }
    if !table.body_rows().is_empty() {
        out.push_str("<tbody>\n");
        for row in table.body_rows() {
            out.push_str(&row_html(row, "td"));
        }
        out.push_str("</tbody>\n");
    }
    out.push_str("</table>\n");
    out
}

fn error_events(message: &str) -> Vec<Event<'static>> {
    vec![Event::Html(
        format!("<div class=\"error\">{}</div>\n", encode_text(message)).into(),
    )]
}
