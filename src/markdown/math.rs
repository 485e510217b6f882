//! Math placeholder protocol
//!
//! Math spans are lifted out of the Markdown source before parsing, so
//! emphasis, escapes and table pipes cannot corrupt LaTeX. Each span is
//! replaced by an opaque inline-HTML token:
//!
//! ```text
//! <span class="pd-ph"><!--pd-math:N--></span>
//! ```
//!
//! The wrapper keeps the token inline (a bare comment at line start would
//! open an HTML block) and the comment body is never touched by the parser.
//! After parsing, tokens are restored to `$tex$` / `$$tex$$` inside
//! `span.math-inline` / `span.math-display` elements for the math adapter.
//!
//! Matching is a single left-to-right pass. At each position the
//! delimiters are tried in priority order (`$$`, `\[`, `\(`, `$`) and the
//! first that matches wins; the scan then resumes after the span, so text
//! inside an extracted span is never matched again. Fenced code blocks,
//! code spans, backslash escapes and HTML tags are copied through untouched.

use crate::dom::{escape_attr, escape_text};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Delimiter a math span was written with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathDelimiter {
    /// `$...$`
    Dollar,
    /// `$$...$$`
    DoubleDollar,
    /// `\[...\]`
    Bracket,
    /// `\(...\)`
    Paren,
    /// ```` ```math ```` fenced block
    Fenced,
}

impl MathDelimiter {
    pub fn is_display(&self) -> bool {
        matches!(
            self,
            MathDelimiter::DoubleDollar | MathDelimiter::Bracket | MathDelimiter::Fenced
        )
    }
}

/// A math span lifted out of the source, waiting for the math adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMathSpan {
    pub id: usize,
    /// TeX between the delimiters, verbatim
    pub tex: String,
    pub display: bool,
    pub delimiter: MathDelimiter,
    /// The span as written, delimiters included
    pub source: String,
}

impl PendingMathSpan {
    /// `$tex$` or `$$tex$$`
    pub fn canonical(&self) -> String {
        if self.display {
            format!("$${}$$", self.tex)
        } else {
            format!("${}$", self.tex)
        }
    }
}

/// Source with math replaced by placeholder tokens
#[derive(Debug, Default, Clone)]
pub struct MathExtraction {
    pub text: String,
    pub spans: Vec<PendingMathSpan>,
}

/// Placeholder token for span `id`
pub fn placeholder(id: usize) -> String {
    format!("<span class=\"pd-ph\"><!--pd-math:{}--></span>", id)
}

fn placeholder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r#"<span class="pd-ph"><!--pd-math:(\d+)--></span>"#,
            r#"|&lt;span class=&quot;pd-ph&quot;&gt;&lt;!--pd-math:(\d+)--&gt;&lt;/span&gt;"#
        ))
        .expect("placeholder pattern is valid")
    })
}

/// Inline raw HTML as CommonMark recognises it: open tag, closing tag,
/// comment, processing instruction, declaration or CDATA section
fn raw_html_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r#"\A(?:"#,
            r#"<[A-Za-z][A-Za-z0-9-]*"#,
            r#"(?:\s+[A-Za-z_:][A-Za-z0-9_.:-]*(?:\s*=\s*(?:[^\s"'=<>`]+|'[^']*'|"[^"]*"))?)*"#,
            r#"\s*/?>"#,
            r#"|</[A-Za-z][A-Za-z0-9-]*\s*>"#,
            r#"|<!--[\s\S]*?-->"#,
            r#"|<\?[\s\S]*?\?>"#,
            r#"|<![A-Za-z][^>]*>"#,
            r#"|<!\[CDATA\[[\s\S]*?\]\]>"#,
            r#")"#
        ))
        .expect("raw HTML pattern is valid")
    })
}

/// Replace every math span in `source` with a placeholder token
pub fn extract_math(source: &str) -> MathExtraction {
    let mut scanner = Scanner {
        src: source,
        out: String::with_capacity(source.len()),
        spans: Vec::new(),
    };
    scanner.run();
    MathExtraction {
        text: scanner.out,
        spans: scanner.spans,
    }
}

/// Put the math back into parsed HTML
///
/// Tokens that ended up escaped (inside an indented code block) are
/// restored to the original source text, escaped the same way.
pub fn restore_math(html: &str, spans: &[PendingMathSpan]) -> String {
    placeholder_pattern()
        .replace_all(html, |caps: &Captures| {
            let (id, escaped) = match (caps.get(1), caps.get(2)) {
                (Some(id), _) => (id.as_str(), false),
                (None, Some(id)) => (id.as_str(), true),
                (None, None) => return String::new(),
            };
            let span = id
                .parse::<usize>()
                .ok()
                .and_then(|id| spans.iter().find(|span| span.id == id));
            match span {
                Some(span) if escaped => escape_attr(&span.source),
                Some(span) => math_element(span),
                None => {
                    log::warn!("Math placeholder {} has no pending span", id);
                    String::new()
                }
            }
        })
        .into_owned()
}

fn math_element(span: &PendingMathSpan) -> String {
    let class = if span.display {
        "math-display"
    } else {
        "math-inline"
    };
    format!(
        "<span class=\"{}\" data-math-id=\"{}\">{}</span>",
        class,
        span.id,
        escape_text(&span.canonical())
    )
}

struct Scanner<'a> {
    src: &'a str,
    out: String,
    spans: Vec<PendingMathSpan>,
}

impl Scanner<'_> {
    fn run(&mut self) {
        let bytes = self.src.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let at_line_start = i == 0 || bytes[i - 1] == b'\n';
            if at_line_start {
                if let Some(next) = self.fenced_block(i) {
                    i = next;
                    continue;
                }
            }
            i = match bytes[i] {
                b'`' => self.code_span(i),
                b'\\' => self.backslash(i),
                b'$' => self.dollar(i),
                b'<' => self.html_tag(i),
                b'\n' => {
                    self.out.push('\n');
                    i + 1
                }
                _ => {
                    let end = self.src[i..]
                        .find(['`', '\\', '$', '<', '\n'])
                        .map(|offset| i + offset)
                        .unwrap_or(self.src.len());
                    self.out.push_str(&self.src[i..end]);
                    end
                }
            };
        }
    }

    fn emit(&mut self, tex: &str, delimiter: MathDelimiter, source: &str) {
        let id = self.spans.len();
        self.spans.push(PendingMathSpan {
            id,
            tex: tex.to_string(),
            display: delimiter.is_display(),
            delimiter,
            source: source.to_string(),
        });
        self.out.push_str(&placeholder(id));
    }

    fn copy(&mut self, start: usize, end: usize) -> usize {
        self.out.push_str(&self.src[start..end]);
        end
    }

    /// Fenced code block starting at a line start; math fences become display math
    fn fenced_block(&mut self, start: usize) -> Option<usize> {
        let src = self.src;
        let first_end = line_end(src, start);
        let line = &src[start..first_end];
        let trimmed = line.trim_start_matches(' ');
        let indent = line.len() - trimmed.len();
        if indent > 3 {
            return None;
        }

        let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let fence_len = trimmed.chars().take_while(|c| *c == fence_char).count();
        if fence_len < 3 {
            return None;
        }
        let info = trimmed[fence_len..].trim();
        if fence_char == '`' && info.contains('`') {
            return None;
        }
        let language = info.split_whitespace().next().unwrap_or("");

        let body_start = next_line(src, first_end);
        let mut pos = body_start;
        let mut close = None;
        while pos < src.len() {
            let end = line_end(src, pos);
            let candidate = &src[pos..end];
            let candidate_trimmed = candidate.trim_start_matches(' ');
            if candidate.len() - candidate_trimmed.len() <= 3 {
                let run = candidate_trimmed
                    .chars()
                    .take_while(|c| *c == fence_char)
                    .count();
                if run >= fence_len && candidate_trimmed[run..].trim().is_empty() {
                    close = Some((pos, next_line(src, end)));
                    break;
                }
            }
            pos = next_line(src, end);
        }
        let (body_end, after) = close.unwrap_or((src.len(), src.len()));

        if !language.eq_ignore_ascii_case("math") {
            return Some(self.copy(start, after));
        }

        let tex = src[body_start..body_end].trim_end_matches(['\n', '\r']);
        let source = src[start..after].trim_end_matches(['\n', '\r']);
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
        self.out.push_str(&line[..indent]);
        self.emit(tex, MathDelimiter::Fenced, source);
        self.out.push_str("\n\n");
        Some(after)
    }

    fn code_span(&mut self, start: usize) -> usize {
        let src = self.src;
        let run = backtick_run(src, start);
        let mut search = start + run;
        while let Some(offset) = src[search..].find('`') {
            let candidate = search + offset;
            let candidate_run = backtick_run(src, candidate);
            if has_blank_line(&src[start..candidate]) {
                break;
            }
            if candidate_run == run {
                return self.copy(start, candidate + candidate_run);
            }
            search = candidate + candidate_run;
        }
        self.copy(start, start + run)
    }

    fn backslash(&mut self, start: usize) -> usize {
        let next = self.src[start + 1..].chars().next();
        let delimited = match next {
            Some('[') => self.delimited(start, "\\[", "\\]", MathDelimiter::Bracket),
            Some('(') => self.delimited(start, "\\(", "\\)", MathDelimiter::Paren),
            _ => None,
        };
        match delimited {
            Some(end) => end,
            None => {
                let len = 1 + next.map(char::len_utf8).unwrap_or(0);
                self.copy(start, start + len)
            }
        }
    }

    fn dollar(&mut self, start: usize) -> usize {
        if self.src[start..].starts_with("$$") {
            if let Some(end) = self.delimited(start, "$$", "$$", MathDelimiter::DoubleDollar) {
                return end;
            }
        }
        match self.delimited(start, "$", "$", MathDelimiter::Dollar) {
            Some(end) => end,
            None => self.copy(start, start + 1),
        }
    }

    fn delimited(
        &mut self,
        start: usize,
        open: &str,
        close: &str,
        delimiter: MathDelimiter,
    ) -> Option<usize> {
        let src = self.src;
        let content_start = start + open.len();
        let offset = src[content_start..].find(close)?;
        let tex = &src[content_start..content_start + offset];
        if tex.trim().is_empty() || has_blank_line(tex) {
            return None;
        }
        let end = content_start + offset + close.len();
        self.emit(tex, delimiter, &src[start..end]);
        Some(end)
    }

    /// Copy inline raw HTML through so attribute values are never matched;
    /// a `<` that does not start markup (`x<y`) is plain text
    fn html_tag(&mut self, start: usize) -> usize {
        let rest = &self.src[start..];
        match raw_html_pattern().find(rest) {
            Some(tag) if !has_blank_line(tag.as_str()) => self.copy(start, start + tag.end()),
            _ => self.copy(start, start + 1),
        }
    }
}

fn line_end(src: &str, from: usize) -> usize {
    src[from..]
        .find('\n')
        .map(|offset| from + offset)
        .unwrap_or(src.len())
}

fn next_line(src: &str, line_end: usize) -> usize {
    (line_end + 1).min(src.len())
}

fn backtick_run(src: &str, from: usize) -> usize {
    src[from..].bytes().take_while(|b| *b == b'`').count()
}

fn has_blank_line(s: &str) -> bool {
    let lines: Vec<&str> = s.split('\n').collect();
    lines.len() >= 3 && lines[1..lines.len() - 1].iter().any(|l| l.trim().is_empty())
}
