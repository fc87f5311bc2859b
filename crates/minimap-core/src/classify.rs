//! Line classification.
//!
//! Each line is classified from its own text only; there is no cross-line context. A fenced
//! code block therefore yields two [`LineClass::CodeFence`] delimiter lines, and the lines
//! between them classify like any other line.
//!
//! Rules are tried in order and the first match wins:
//!
//! | # | Class | Pattern |
//! |---|---|---|
//! | 1 | `ImageEmbed` | `![[target.png]]` (image extension) or `![alt](url)` |
//! | 2 | `GenericEmbed` | any other `![[target]]` |
//! | 3 | `Header(level)` | 1-6 `#` at the start of the line, then whitespace or end of line |
//! | 4 | `CodeFence` | trimmed line starts with three backticks |
//! | 5 | `TableRow` | contains `\|` and at least one non-empty cell |
//! | 6 | `PlainText` | any other non-blank line |
//! | 7 | `Blank` | empty or whitespace-only |

use crate::settings::Settings;
use regex::Regex;
use std::sync::LazyLock;

static WIKI_EMBED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!\[\[([^\[\]]+)\]\]$").expect("valid embed regex"));

static MARKDOWN_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^!\[[^\]]*\]\(\s*([^)\s]+)(?:\s+"[^"]*")?\s*\)$"#).expect("valid image regex")
});

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})(?:\s|$)").expect("valid header regex"));

const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "gif", "bmp", "svg", "webp", "avif"];

/// Paint category of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineClass {
    /// An embedded image.
    ImageEmbed,
    /// An embedded note or other non-image resource.
    GenericEmbed,
    /// A `#` header with its level (1..=6).
    Header(u8),
    /// A code fence delimiter line.
    CodeFence,
    /// A pipe-delimited table row.
    TableRow {
        /// Number of non-empty cells.
        cells: usize,
    },
    /// Any other line with visible content.
    PlainText,
    /// An empty or whitespace-only line.
    Blank,
}

impl LineClass {
    /// Short stable name, used in logs and display lists.
    pub fn name(self) -> &'static str {
        match self {
            Self::ImageEmbed => "image-embed",
            Self::GenericEmbed => "generic-embed",
            Self::Header(_) => "header",
            Self::CodeFence => "code-fence",
            Self::TableRow { .. } => "table-row",
            Self::PlainText => "plain-text",
            Self::Blank => "blank",
        }
    }
}

/// Which optional rules take part in classification.
///
/// A disabled rule is skipped, so a matching line falls through to the later rules (a header
/// with headers disabled paints as plain text).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Enable rule 3 (headers).
    pub headers: bool,
    /// Enable rule 4 (code fences).
    pub code_fences: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            headers: true,
            code_fences: true,
        }
    }
}

impl ClassifyOptions {
    /// Options matching the visibility flags of `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            headers: settings.show_headers,
            code_fences: settings.show_code_blocks,
        }
    }
}

/// Classify `line` with every rule enabled.
pub fn classify(line: &str) -> LineClass {
    classify_with(line, ClassifyOptions::default())
}

/// Classify `line`, skipping the rules disabled in `options`.
pub fn classify_with(line: &str, options: ClassifyOptions) -> LineClass {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineClass::Blank;
    }

    if MARKDOWN_IMAGE.is_match(trimmed) {
        return LineClass::ImageEmbed;
    }
    if let Some(target) = wiki_embed_target(trimmed) {
        return if is_image_target(target) {
            LineClass::ImageEmbed
        } else {
            LineClass::GenericEmbed
        };
    }

    if options.headers {
        if let Some(level) = header_level(line) {
            return LineClass::Header(level);
        }
    }

    if options.code_fences && trimmed.starts_with("```") {
        return LineClass::CodeFence;
    }

    if trimmed.contains('|') {
        let cells = table_cell_count(trimmed);
        if cells > 0 {
            return LineClass::TableRow { cells };
        }
    }

    LineClass::PlainText
}

/// Header level of `line`, if it is a header.
pub fn header_level(line: &str) -> Option<u8> {
    HEADER
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|hashes| hashes.as_str().len() as u8)
}

/// The visible text of a header line, without the leading `#` run.
pub fn header_text(line: &str) -> &str {
    line.trim_start().trim_start_matches('#').trim()
}

/// Number of non-empty pipe-delimited segments in `line`.
pub fn table_cell_count(line: &str) -> usize {
    line.split('|')
        .filter(|segment| !segment.trim().is_empty())
        .count()
}

/// Number of leading whitespace characters.
pub fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// The image referenced by an image embed line, if any.
///
/// Wiki-style targets lose their `|size` and `#anchor` suffixes.
pub fn image_reference(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if let Some(caps) = MARKDOWN_IMAGE.captures(trimmed) {
        return caps.get(1).map(|m| m.as_str());
    }
    wiki_embed_target(trimmed).filter(|target| is_image_target(target))
}

fn wiki_embed_target(trimmed: &str) -> Option<&str> {
    let target = WIKI_EMBED.captures(trimmed)?.get(1)?.as_str();
    let target = target.split(['|', '#']).next().unwrap_or(target).trim();
    (!target.is_empty()).then_some(target)
}

fn is_image_target(target: &str) -> bool {
    target
        .rsplit_once('.')
        .map(|(_, ext)| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
