//! Text helpers shared by the renderer and the page controller.
//!
//! Summary text from the backend is plain text with blank-line separated
//! blocks, `•`/`-` bullets, and internal recall-set markers that must never
//! reach the reader.

use std::borrow::Cow;
use std::fmt::Write;
use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDateTime};
use minijinja::HtmlEscape;
use regex::Regex;

/// Recall-set markers carrying chapter, hash and chunk list.
static CHUNK_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[RS:cap\d+:[a-f0-9]+\|chunks:[^\]]+\]\]").expect("chunk marker regex")
});

/// Any other recall-set marker.
static ANY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[RS:[^\]]+\]\]").expect("marker regex"));

pub const NOT_AVAILABLE_HTML: &str = r#"<p class="text-secondary">Não disponível</p>"#;

/// Removes internal recall-set markers.
pub fn strip_markers(text: &str) -> Cow<'_, str> {
    match CHUNK_MARKER.replace_all(text, "") {
        Cow::Borrowed(_) => ANY_MARKER.replace_all(text, ""),
        Cow::Owned(stripped) => Cow::Owned(ANY_MARKER.replace_all(&stripped, "").into_owned()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block<'a> {
    Paragraph(&'a str),
    Item(&'a str),
}

fn blocks(text: &str) -> impl Iterator<Item = Block<'_>> {
    text.split("\n\n").map(|block| {
        let block = block.trim();
        match block.strip_prefix('•').or_else(|| block.strip_prefix('-')) {
            Some(rest) => Block::Item(rest.trim()),
            None => Block::Paragraph(block),
        }
    })
}

/// Canonical plain-text form of a summary: markers removed, blocks trimmed,
/// bullets written as `- item`.
///
/// `normalize_summary` is idempotent and `format_summary` gives the same HTML
/// for a text and its normalized form.
pub fn normalize_summary(text: &str) -> String {
    let stripped = strip_markers(text);
    let parts: Vec<String> = blocks(&stripped)
        .map(|block| match block {
            Block::Paragraph(p) => p.to_string(),
            Block::Item(item) => format!("- {item}"),
        })
        .collect();
    parts.join("\n\n")
}

/// Converts summary text into escaped HTML paragraphs and lists.
///
/// Consecutive bullet blocks share one `<ul>`.
pub fn format_summary(text: &str) -> String {
    let stripped = strip_markers(text);
    if stripped.trim().is_empty() {
        return NOT_AVAILABLE_HTML.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut items: Vec<String> = Vec::new();
    for block in blocks(&stripped) {
        match block {
            Block::Item(item) => items.push(format!("<li>{}</li>", HtmlEscape(item))),
            Block::Paragraph(p) => {
                flush_items(&mut lines, &mut items);
                lines.push(format!("<p>{}</p>", HtmlEscape(p)));
            }
        }
    }
    flush_items(&mut lines, &mut items);
    lines.join("\n")
}

fn flush_items(lines: &mut Vec<String>, items: &mut Vec<String>) {
    if !items.is_empty() {
        lines.push(format!("<ul>{}</ul>", items.join("\n")));
        items.clear();
    }
}

/// `B` below 1 KiB, then `KB`/`MB` with one decimal.
pub fn format_file_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < KIB * KIB {
        format!("{:.1} KB", round_half_up(bytes as f64 / KIB as f64, 1))
    } else {
        format!("{:.1} MB", round_half_up(bytes as f64 / (KIB * KIB) as f64, 1))
    }
}

/// `📄 name (size)` line shown for a selected file.
pub fn file_label(name: &str, bytes: u64) -> String {
    format!("📄 {name} ({})", format_file_size(bytes))
}

/// Live character counter for the text area.
pub fn char_count_label(text: &str) -> String {
    format!("{} caracteres", text.chars().count())
}

/// Thousands grouping with `.` as separator (pt-BR).
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Summary/original ratio with two decimals and a comma, e.g. `25,00`.
///
/// `None` when the original word count is zero.
pub fn reduction_ratio(original: u64, summary: u64) -> Option<String> {
    if original == 0 {
        return None;
    }
    let pct = round_half_up(summary as f64 / original as f64 * 100.0, 2);
    Some(format!("{pct:.2}").replace('.', ","))
}

/// Word-count line shown for a chapter in the TOC and on its card.
pub fn chapter_metric_text(original: u64, summary: u64) -> String {
    match reduction_ratio(original, summary) {
        Some(ratio) => format!(
            "Original - {} palavras | Resumo - {} palavras | % resumo/original {ratio}%",
            group_thousands(original),
            group_thousands(summary)
        ),
        None => format!("Resumo - {} palavras", group_thousands(summary)),
    }
}

/// Percentage with one decimal, as the banner and coverage cards show it.
pub fn percent_1(value: f64) -> String {
    format!("{:.1}", round_half_up(value, 1))
}

/// Ties round away from zero; `{:.N}` alone would round them to even.
pub fn round_half_up(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Renders a stored timestamp as `dd/mm/aaaa, hh:mm:ss` in local time.
///
/// Naive timestamps are taken as already local. Unparseable input is
/// returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    const DISPLAY: &str = "%d/%m/%Y, %H:%M:%S";
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format(DISPLAY).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return naive.format(DISPLAY).to_string();
        }
    }
    raw.to_string()
}

/// `📊 N palavras → M palavras | ⏱️ T.Ts` line of a history card.
pub fn history_stats_line(words_in: u64, words_out: u64, seconds: Option<f64>) -> String {
    let mut line = format!("📊 {words_in} palavras → {words_out} palavras");
    if let Some(secs) = seconds.filter(|s| *s > 0.0) {
        let _ = write!(line, " | ⏱️ {:.1}s", round_half_up(secs, 1));
    }
    line
}

/// Last `/` segment of an exported path; the download endpoint only takes names.
pub fn download_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
