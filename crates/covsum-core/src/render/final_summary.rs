//! Concatenated per-chapter summary for copy and Markdown export.

use std::fmt::Write;

use serde::Serialize;

use crate::format::{format_summary, strip_markers};
use crate::result::ChapterSummaries;

/// File name used when the final summary is exported as Markdown.
pub const FINAL_SUMMARY_FILENAME: &str = "resumo-final.md";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalChapterView {
    pub number: String,
    pub title: String,
    pub summary_html: String,
    pub key_points: Vec<String>,
}

/// All chapters in received order, as Markdown text and as a template context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalSummaryView {
    #[serde(skip)]
    pub markdown: String,
    pub chapters: Vec<FinalChapterView>,
}

impl FinalSummaryView {
    /// `None` when there are no chapters to concatenate.
    pub fn build(summaries: &ChapterSummaries) -> Option<Self> {
        if summaries.capitulos.is_empty() {
            return None;
        }

        let mut markdown = String::new();
        let mut chapters = Vec::with_capacity(summaries.capitulos.len());
        for chapter in &summaries.capitulos {
            let resumo = strip_markers(&chapter.resumo);
            let _ = write!(
                markdown,
                "# Capítulo {}: {}\n\n{resumo}\n\n",
                chapter.numero, chapter.titulo
            );
            if !chapter.pontos_chave.is_empty() {
                markdown.push_str("## Pontos-Chave\n\n");
                for point in &chapter.pontos_chave {
                    let _ = writeln!(markdown, "- {point}");
                }
                markdown.push('\n');
            }

            chapters.push(FinalChapterView {
                number: chapter.numero.to_string(),
                title: chapter.titulo.clone(),
                summary_html: format_summary(&chapter.resumo),
                key_points: chapter.pontos_chave.clone(),
            });
        }

        Some(Self { markdown, chapters })
    }
}
