//! Inline markup: `{tag{inner}}` spans parsed into a small node tree.
//!
//! Only a fixed set of presentational tags is recognized (`b`, `i`, `u`,
//! `small`, `sup`, `sub`). Any other span is ordinary text and is kept
//! verbatim, braces included.

use std::fmt;

/// A recognized markup tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Bold,
    Italic,
    Underline,
    Small,
    Superscript,
    Subscript,
}

impl Tag {
    /// Look up a tag by the name used in translation text.
    pub fn from_name(name: &str) -> Option<Tag> {
        match name {
            "b" => Some(Tag::Bold),
            "i" => Some(Tag::Italic),
            "u" => Some(Tag::Underline),
            "small" => Some(Tag::Small),
            "sup" => Some(Tag::Superscript),
            "sub" => Some(Tag::Subscript),
            _ => None,
        }
    }

    /// The name used in translation text, which is also the HTML element name.
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Bold => "b",
            Tag::Italic => "i",
            Tag::Underline => "u",
            Tag::Small => "small",
            Tag::Superscript => "sup",
            Tag::Subscript => "sub",
        }
    }
}

/// One segment of parsed markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element { tag: Tag, children: Vec<Node> },
}

impl Node {
    fn write_plain(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element { children, .. } => {
                for child in children {
                    child.write_plain(out);
                }
            }
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => escape_html_into(text, out),
            Node::Element { tag, children } => {
                out.push('<');
                out.push_str(tag.name());
                out.push('>');
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag.name());
                out.push('>');
            }
        }
    }
}

/// The result of evaluating a leaf: plain text, or text interleaved with
/// markup elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    Markup(Vec<Node>),
}

impl Rendered {
    /// The text if no markup was produced.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Rendered::Text(text) => Some(text),
            Rendered::Markup(_) => None,
        }
    }

    pub fn is_markup(&self) -> bool {
        matches!(self, Rendered::Markup(_))
    }

    /// Flatten to text, dropping all markup.
    pub fn to_plain_text(&self) -> String {
        match self {
            Rendered::Text(text) => text.clone(),
            Rendered::Markup(nodes) => {
                let mut out = String::new();
                for node in nodes {
                    node.write_plain(&mut out);
                }
                out
            }
        }
    }

    /// Render as an HTML fragment with text escaped.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        match self {
            Rendered::Text(text) => escape_html_into(text, &mut out),
            Rendered::Markup(nodes) => {
                for node in nodes {
                    node.write_html(&mut out);
                }
            }
        }
        out
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendered::Text(text) => f.write_str(text),
            Rendered::Markup(_) => f.write_str(&self.to_plain_text()),
        }
    }
}

impl From<String> for Rendered {
    fn from(text: String) -> Self {
        Rendered::Text(text)
    }
}

impl From<&str> for Rendered {
    fn from(text: &str) -> Self {
        Rendered::Text(text.to_string())
    }
}

/// Deepest element nesting that is parsed. Spans nested any deeper are kept
/// as literal text.
pub const MAX_TAG_DEPTH: usize = 16;

/// Parse `{tag{inner}}` spans.
///
/// Returns the input unchanged as [`Rendered::Text`] when it contains no
/// recognized span. Inner content is parsed for nested spans; a span's inner
/// text ends at the first `}}` at its own nesting level.
pub fn parse_tags(text: &str) -> Rendered {
    let mut nodes = parse_nodes(text);
    match nodes.len() {
        0 => Rendered::Text(String::new()),
        1 if matches!(nodes[0], Node::Text(_)) => match nodes.pop() {
            Some(Node::Text(text)) => Rendered::Text(text),
            _ => Rendered::Text(String::new()),
        },
        _ => Rendered::Markup(nodes),
    }
}

/// A balanced `{word{ ... }}` span: `inner` is where its content starts and
/// `close` is the index of its closing `}}`.
#[derive(Debug, Clone, Copy)]
struct Span {
    inner: usize,
    close: usize,
}

/// An element being built, or the root when `tag` is `None`.
struct Frame {
    tag: Option<Tag>,
    end: usize,
    nodes: Vec<Node>,
    plain: String,
}

impl Frame {
    fn new(tag: Option<Tag>, end: usize) -> Self {
        Self {
            tag,
            end,
            nodes: Vec::new(),
            plain: String::new(),
        }
    }

    fn flush(&mut self) {
        if !self.plain.is_empty() {
            self.nodes.push(Node::Text(std::mem::take(&mut self.plain)));
        }
    }
}

fn parse_nodes(text: &str) -> Vec<Node> {
    let bytes = text.as_bytes();
    let spans = match_spans(bytes);
    let mut stack = vec![Frame::new(None, bytes.len())];
    let mut last = 0;
    let mut i = 0;

    loop {
        let depth = stack.len().saturating_sub(1);
        let Some(top) = stack.last_mut() else {
            return Vec::new();
        };

        if i >= top.end {
            let end = top.end;
            top.plain.push_str(&text[last..end]);
            top.flush();
            let Some(frame) = stack.pop() else {
                return Vec::new();
            };
            let (Some(tag), Some(parent)) = (frame.tag, stack.last_mut()) else {
                return frame.nodes;
            };
            parent.nodes.push(Node::Element {
                tag,
                children: frame.nodes,
            });
            i = end + 2;
            last = i;
            continue;
        }

        let Some(span) = spans[i] else {
            i += 1;
            continue;
        };

        let tag = Tag::from_name(&text[i + 1..span.inner - 1]).filter(|_| depth < MAX_TAG_DEPTH);
        match tag {
            Some(tag) => {
                top.plain.push_str(&text[last..i]);
                top.flush();
                stack.push(Frame::new(Some(tag), span.close));
                i = span.inner;
                last = i;
            }
            // Kept verbatim with its inner text; `last` stays put.
            None => i = span.close + 2,
        }
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Length of a `{word{` opener starting at `start`, if there is one.
fn opener_len(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes.get(start) != Some(&b'{') {
        return None;
    }
    let mut j = start + 1;
    while j < bytes.len() && is_word_byte(bytes[j]) {
        j += 1;
    }
    if j == start + 1 || bytes.get(j) != Some(&b'{') {
        return None;
    }
    Some(j + 1 - start)
}

/// Pair every opener with its closing `}}` in one pass, indexed by the
/// opener's start. Openers left without a closer map to `None`.
fn match_spans(bytes: &[u8]) -> Vec<Option<Span>> {
    let mut spans = vec![None; bytes.len()];
    let mut open: Vec<(usize, usize)> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if let Some(len) = opener_len(bytes, i) {
            open.push((i, i + len));
            i += len;
        } else if bytes[i] == b'}' && bytes.get(i + 1) == Some(&b'}') {
            match open.pop() {
                Some((start, inner)) => {
                    spans[start] = Some(Span { inner, close: i });
                    i += 2;
                }
                None => i += 1,
            }
        } else {
            i += 1;
        }
    }
    spans
}

fn escape_html_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
