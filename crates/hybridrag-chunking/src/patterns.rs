//! Pattern matching for structured documents.
//!
//! Everything regex-based lives here: section headers, labeled
//! question/answer pairs and dated timeline bullets. Offsets are byte offsets
//! into the scanned text. A real document parser can replace this module
//! without touching the chunkers' callers.

use hybridrag_core::{ChunkType, RagError, RagResult};
use regex::Regex;
use std::ops::Range;

const ATX_HEADER: &str = r"(?m)^[ \t]{0,3}#{1,6}[ \t]+(.+?)(?:[ \t]+#+)?[ \t\r]*$";
const BOLD_HEADER: &str = r"(?m)^[ \t]*\*\*([^*\n]+?)\*\*[ \t]*:?[ \t\r]*$";
const QUESTION: &str = r"(?mi)^[ \t]*(?:\*\*)?(?:q|question)[ \t]*\d*(?:\*\*)?[ \t]*:";
const ANSWER: &str = r"(?mi)^[ \t]*(?:\*\*)?(?:a|answer)[ \t]*\d*(?:\*\*)?[ \t]*:";
const TIMELINE: &str = r"(?mi)^[ \t]*[-*•][ \t]+(?:\*\*)?\(?(?:(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[ \t]+)?(?:19|20)\d{2}\b(?:[-/.]\d{1,2})?(?:[ \t]*(?:-|–|to)[ \t]*(?:(?:(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[ \t]+)?(?:19|20)\d{2}|present|current|now))?";

/// A section header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub title: String,
    /// The header line itself, without its line break.
    pub line: Range<usize>,
}

/// A span that must be emitted as exactly one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicUnit {
    pub kind: ChunkType,
    pub span: Range<usize>,
}

/// Compiled patterns for structure detection.
#[derive(Debug, Clone)]
pub struct StructurePatterns {
    atx_header: Regex,
    bold_header: Regex,
    question: Regex,
    answer: Regex,
    timeline: Regex,
}

impl StructurePatterns {
    pub fn new() -> RagResult<Self> {
        Ok(Self {
            atx_header: compile(ATX_HEADER)?,
            bold_header: compile(BOLD_HEADER)?,
            question: compile(QUESTION)?,
            answer: compile(ANSWER)?,
            timeline: compile(TIMELINE)?,
        })
    }

    /// Header lines in document order.
    pub fn headers(&self, text: &str) -> Vec<Header> {
        let mut headers: Vec<Header> = self
            .atx_header
            .captures_iter(text)
            .chain(self.bold_header.captures_iter(text))
            .filter_map(|caps| {
                let line = caps.get(0)?;
                let title = caps.get(1)?.as_str().trim().trim_end_matches(':').trim();
                if title.is_empty() {
                    return None;
                }
                Some(Header {
                    title: title.to_string(),
                    line: line.start()..trim_end_offset(text, line.start(), line.end()),
                })
            })
            .collect();
        headers.sort_by_key(|h| h.line.start);
        headers
    }

    /// Q&A pairs and timeline entries in document order.
    ///
    /// A Q&A pair runs from its question label to the next question label or
    /// header and only counts if an answer label follows the question line.
    /// Timeline entries cover the dated bullet line plus its indented
    /// continuation lines; bullets inside a Q&A pair belong to the pair.
    pub fn atomic_units(&self, text: &str) -> Vec<AtomicUnit> {
        let header_starts: Vec<usize> = self.headers(text).iter().map(|h| h.line.start).collect();
        let question_starts: Vec<usize> = self.question.find_iter(text).map(|m| m.start()).collect();

        let mut units = Vec::new();
        for (i, &start) in question_starts.iter().enumerate() {
            let next_question = question_starts.get(i + 1).copied().unwrap_or(text.len());
            let next_header = header_starts
                .iter()
                .copied()
                .find(|&h| h > start)
                .unwrap_or(text.len());
            let limit = next_question.min(next_header);
            let end = trim_end_offset(text, start, limit);

            let answer_from = line_end(text, start).min(end);
            if self.answer.is_match(&text[answer_from..end]) {
                units.push(AtomicUnit {
                    kind: ChunkType::QaPair,
                    span: start..end,
                });
            }
        }

        let qa_count = units.len();
        for m in self.timeline.find_iter(text) {
            let start = m.start();
            let inside_pair = units[..qa_count]
                .iter()
                .any(|u| u.span.contains(&start));
            if inside_pair {
                continue;
            }
            let end = self.timeline_entry_end(text, start);
            units.push(AtomicUnit {
                kind: ChunkType::TimelineEntry,
                span: start..trim_end_offset(text, start, end),
            });
        }

        units.sort_by_key(|u| u.span.start);
        units
    }

    fn timeline_entry_end(&self, text: &str, start: usize) -> usize {
        let mut end = line_end(text, start);
        while end < text.len() {
            let next_start = end + 1;
            let next_end = line_end(text, next_start);
            let line = &text[next_start..next_end];
            let continues = line.starts_with([' ', '\t'])
                && !line.trim().is_empty()
                && !line.trim_start().starts_with('#')
                && !self.timeline.is_match(line);
            if !continues {
                break;
            }
            end = next_end;
        }
        end
    }
}

fn compile(pattern: &str) -> RagResult<Regex> {
    Regex::new(pattern).map_err(|e| RagError::Chunking(format!("Invalid structure pattern: {e}")))
}

/// Offset of the line break ending the line that contains `pos`, or the text length.
fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map_or(text.len(), |i| pos + i)
}

/// `end` moved back over trailing whitespace, never before `start`.
fn trim_end_offset(text: &str, start: usize, end: usize) -> usize {
    start + text[start..end].trim_end().len()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn patterns() -> StructurePatterns {
        StructurePatterns::new().unwrap()
    }

    #[test]
    fn test_atx_and_bold_headers() {
        let text = "intro\n# Summary\nbody\n## C# Skills ##\nmore\n**Experience:**\nlast";
        let titles: Vec<String> = patterns().headers(text).into_iter().map(|h| h.title).collect();
        assert_eq!(titles, vec!["Summary", "C# Skills", "Experience"]);
    }

    #[test]
    fn test_hash_without_space_is_not_header() {
        assert!(patterns().headers("#hashtag\n####### seven").is_empty());
    }

    #[test]
    fn test_qa_pairs_require_answer() {
        let text = "Q: First?\nA: One.\n\nQ: Dangling question?\n\nQuestion 3: Third?\nAnswer: Three.";
        let units = patterns().atomic_units(text);
        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|u| u.kind == ChunkType::QaPair));
        assert_eq!(&text[units[0].span.clone()], "Q: First?\nA: One.");
        assert!(text[units[1].span.clone()].ends_with("Three."));
    }

    #[test]
    fn test_qa_pair_stops_at_header() {
        let text = "Q: Why?\nA: Because.\n# Next\nSome text";
        let units = patterns().atomic_units(text);
        assert_eq!(units.len(), 1);
        assert_eq!(&text[units[0].span.clone()], "Q: Why?\nA: Because.");
    }

    #[test]
    fn test_timeline_entries_with_continuations() {
        let text = "- 2019 - 2021: Backend engineer\n  Built ingestion services\n  in Rust\n- Mar 2021 - Present: Staff engineer\nNot part of the entry";
        let units = patterns().atomic_units(text);
        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|u| u.kind == ChunkType::TimelineEntry));
        assert!(text[units[0].span.clone()].ends_with("in Rust"));
        assert_eq!(&text[units[1].span.clone()], "- Mar 2021 - Present: Staff engineer");
    }

    #[test]
    fn test_undated_bullets_ignored() {
        assert!(patterns().atomic_units("- plain bullet\n- another 2020 mention").is_empty());
    }
}
