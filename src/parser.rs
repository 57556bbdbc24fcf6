use std::sync::LazyLock;

use regex::Regex;

use crate::block::{Block, List, QuoteLine, Table};
use crate::inline::format_inline;

const FENCE: &str = "```";

/// `1. text` inside a blockquote.
static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s(.*)$").expect("invalid numbered item regex"));

/// Parse markup text into a list of blocks
pub fn parse(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut state = ParseState::default();

    for line in text.split('\n') {
        process_line(line, &mut state, &mut blocks);
    }
    state.finish(&mut blocks);

    tracing::debug!(blocks = blocks.len(), "Parsed markup");
    blocks
}

#[derive(Default)]
struct ParseState {
    // Verbatim block state
    in_code_block: bool,
    code_language: Option<String>,
    code_lines: Vec<String>,

    // Table state
    in_table: bool,
    table_rows: Vec<Vec<String>>,

    list_items: Vec<String>,
    quote_lines: Vec<QuoteLine>,
}

impl ParseState {
    fn flush_list(&mut self, blocks: &mut Vec<Block>) {
        if !self.list_items.is_empty() {
            blocks.push(Block::List(List {
                ordered: false,
                items: std::mem::take(&mut self.list_items),
            }));
        }
    }

    fn flush_quote(&mut self, blocks: &mut Vec<Block>) {
        if !self.quote_lines.is_empty() {
            blocks.push(Block::Blockquote {
                lines: std::mem::take(&mut self.quote_lines),
            });
        }
    }

    fn flush_table(&mut self, blocks: &mut Vec<Block>) {
        self.in_table = false;
        if self.table_rows.is_empty() {
            return;
        }
        let mut rows = std::mem::take(&mut self.table_rows);
        let header = if rows.len() > 1 {
            Some(rows.remove(0))
        } else {
            None
        };
        blocks.push(Block::Table(Table { header, rows }));
    }

    fn flush_all(&mut self, blocks: &mut Vec<Block>) {
        self.flush_list(blocks);
        self.flush_quote(blocks);
        self.flush_table(blocks);
    }

    fn close_code_block(&mut self, blocks: &mut Vec<Block>) {
        self.in_code_block = false;
        blocks.push(Block::CodeBlock {
            language: self.code_language.take(),
            lines: std::mem::take(&mut self.code_lines),
        });
    }

    fn finish(&mut self, blocks: &mut Vec<Block>) {
        self.flush_all(blocks);
        // An unterminated verbatim block keeps whatever it buffered
        if self.in_code_block && !self.code_lines.is_empty() {
            self.close_code_block(blocks);
        }
    }
}

fn process_line(line: &str, state: &mut ParseState, blocks: &mut Vec<Block>) {
    // Verbatim fences win over everything, wherever they appear in the line
    if line.contains(FENCE) {
        if state.in_code_block {
            state.close_code_block(blocks);
        } else {
            state.flush_all(blocks);
            state.in_code_block = true;
            state.code_language = fence_language(line);
        }
        return;
    }
    if state.in_code_block {
        state.code_lines.push(line.to_string());
        return;
    }

    let trimmed = line.trim();

    if trimmed.contains('|') {
        if !is_separator_row(trimmed) {
            state.flush_list(blocks);
            state.flush_quote(blocks);
            state.table_rows.push(split_cells(trimmed));
            state.in_table = true;
        }
        return;
    } else if state.in_table {
        state.flush_table(blocks);
    }

    if matches!(trimmed, "---" | "***" | "___") {
        state.flush_all(blocks);
        blocks.push(Block::Rule);
    } else if let Some((level, rest)) = heading(trimmed) {
        // The document model stops at three heading levels; deeper ones are dropped
        if level <= 3 {
            state.flush_all(blocks);
            blocks.push(Block::Heading {
                level,
                content: format_inline(rest),
            });
        }
    } else if let Some(rest) = trimmed.strip_prefix('>') {
        state.flush_list(blocks);
        state.flush_table(blocks);
        let text = rest.strip_prefix(' ').unwrap_or(rest);
        state.quote_lines.push(classify_quote_line(text));
    } else if let Some(rest) = list_item(trimmed) {
        state.flush_quote(blocks);
        state.flush_table(blocks);
        state.list_items.push(format_inline(rest));
    } else if !trimmed.is_empty() {
        state.flush_all(blocks);
        blocks.push(Block::Paragraph {
            content: format_inline(trimmed),
        });
    } else {
        state.flush_all(blocks);
    }
}

/// Language tag written after an opening fence, e.g. ```` ```rust ````.
fn fence_language(line: &str) -> Option<String> {
    let lang = line.trim().strip_prefix(FENCE)?.trim();
    if lang.is_empty() {
        None
    } else {
        Some(lang.to_string())
    }
}

/// A row counts as a separator when dashes make up at least 80% of its
/// non-whitespace, non-pipe characters.
fn is_separator_row(line: &str) -> bool {
    let dashes = line.chars().filter(|&c| c == '-').count();
    let total = line
        .chars()
        .filter(|&c| c != '|' && !c.is_whitespace())
        .count();
    dashes > 0 && dashes * 5 >= total * 4
}

fn split_cells(line: &str) -> Vec<String> {
    let mut segments: Vec<&str> = line.split('|').collect();
    if segments.last().is_some_and(|s| s.trim().is_empty()) {
        segments.pop();
    }
    if segments.first().is_some_and(|s| s.trim().is_empty()) {
        segments.remove(0);
    }
    segments
        .into_iter()
        .map(|cell| format_inline(cell.trim()))
        .collect()
}

/// `#`-run length and the text after the required space.
fn heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 {
        return None;
    }
    let rest = line[hashes..].strip_prefix(' ')?;
    Some((u8::try_from(hashes).unwrap_or(u8::MAX), rest))
}

fn list_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ").or_else(|| line.strip_prefix("* "))
}

fn classify_quote_line(text: &str) -> QuoteLine {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return QuoteLine::Blank;
    }
    if let Some(rest) = list_item(trimmed) {
        return QuoteLine::Bullet(format_inline(rest));
    }
    if let Some(caps) = NUMBERED_ITEM.captures(trimmed) {
        return QuoteLine::Numbered {
            label: caps[1].to_string(),
            text: format_inline(&caps[2]),
        };
    }
    QuoteLine::Text(format_inline(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn paragraph(content: &str) -> Block {
        Block::Paragraph {
            content: content.to_string(),
        }
    }

    fn list(items: &[&str]) -> Block {
        Block::List(List {
            ordered: false,
            items: items.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn end_to_end_document() {
        let input = "# Title\n\nSome **bold** and *italic* text.\n\n- item one\n- item two\n\n| a | b |\n| - | - |\n| 1 | 2 |";
        assert_eq!(
            parse(input),
            vec![
                Block::Heading {
                    level: 1,
                    content: "Title".to_string()
                },
                paragraph("Some <strong>bold</strong> and <em>italic</em> text."),
                list(&["item one", "item two"]),
                Block::Table(Table {
                    header: Some(row(&["a", "b"])),
                    rows: vec![row(&["1", "2"])],
                }),
            ]
        );
    }

    #[test]
    fn parse_is_deterministic() {
        let input = "# A\n> quote\n> - bullet\n```\ncode\n```\n| x |\ntext";
        assert_eq!(parse(input), parse(input));
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse(""), vec![]);
        assert_eq!(parse("\n\n   \n"), vec![]);
    }

    #[rstest]
    #[case("#### x")]
    #[case("##### x")]
    #[case("###### x")]
    fn deep_headings_are_dropped(#[case] input: &str) {
        assert_eq!(parse(input), vec![]);
    }

    #[test]
    fn heading_levels() {
        assert_eq!(
            parse("### x"),
            vec![Block::Heading {
                level: 3,
                content: "x".to_string()
            }]
        );
        assert_eq!(
            parse("## *x*"),
            vec![Block::Heading {
                level: 2,
                content: "<em>x</em>".to_string()
            }]
        );
    }

    #[test]
    fn hash_without_space_is_paragraph() {
        assert_eq!(parse("#tag"), vec![paragraph("#tag")]);
    }

    #[test]
    fn dropped_heading_does_not_flush_list() {
        assert_eq!(parse("- a\n#### hidden\n- b"), vec![list(&["a", "b"])]);
    }

    #[rstest]
    #[case("---")]
    #[case("***")]
    #[case("___")]
    #[case("  ---  ")]
    fn horizontal_rules(#[case] input: &str) {
        assert_eq!(parse(input), vec![Block::Rule]);
    }

    #[test]
    fn rule_flushes_list() {
        assert_eq!(parse("- a\n---"), vec![list(&["a"]), Block::Rule]);
    }

    #[test]
    fn separator_rows_at_80_percent_are_skipped() {
        // 4 dashes, 1 other character: exactly 80%
        let input = "| h |\n| ----x |\n| v |";
        assert_eq!(
            parse(input),
            vec![Block::Table(Table {
                header: Some(row(&["h"])),
                rows: vec![row(&["v"])],
            })]
        );
    }

    #[test]
    fn separator_rows_below_80_percent_are_data() {
        // 79 dashes, 21 other characters
        let cell = format!("{}{}", "-".repeat(79), "x".repeat(21));
        let input = format!("| h |\n| {cell} |");
        assert_eq!(
            parse(&input),
            vec![Block::Table(Table {
                header: Some(row(&["h"])),
                rows: vec![vec![cell]],
            })]
        );
    }

    #[test]
    fn single_row_table_has_no_header() {
        assert_eq!(
            parse("| only | row |"),
            vec![Block::Table(Table {
                header: None,
                rows: vec![row(&["only", "row"])],
            })]
        );
    }

    #[test]
    fn table_cells_without_outer_pipes() {
        assert_eq!(
            parse("a | **b**"),
            vec![Block::Table(Table {
                header: None,
                rows: vec![row(&["a", "<strong>b</strong>"])],
            })]
        );
    }

    #[test]
    fn separator_outside_table_is_ignored() {
        assert_eq!(parse("|---|---|"), vec![]);
    }

    #[test]
    fn table_ends_at_non_table_line() {
        assert_eq!(
            parse("| a |\n| b |\nafter"),
            vec![
                Block::Table(Table {
                    header: Some(row(&["a"])),
                    rows: vec![row(&["b"])],
                }),
                paragraph("after"),
            ]
        );
    }

    #[test]
    fn code_block_is_verbatim() {
        let input = "```rust\n# not a heading\n| not | table |\n- **raw**\n```";
        assert_eq!(
            parse(input),
            vec![Block::CodeBlock {
                language: Some("rust".to_string()),
                lines: row(&["# not a heading", "| not | table |", "- **raw**"]),
            }]
        );
    }

    #[test]
    fn fence_anywhere_in_line_toggles() {
        assert_eq!(
            parse("see ```\nx\n```"),
            vec![Block::CodeBlock {
                language: None,
                lines: row(&["x"]),
            }]
        );
    }

    #[test]
    fn unterminated_code_block_is_emitted() {
        assert_eq!(
            parse("```\nline one\n  line two"),
            vec![Block::CodeBlock {
                language: None,
                lines: row(&["line one", "  line two"]),
            }]
        );
    }

    #[test]
    fn unterminated_empty_code_block_is_dropped() {
        assert_eq!(parse("para\n```"), vec![paragraph("para")]);
    }

    #[test]
    fn blockquote_lines_are_classified() {
        let input = "> plain *text*\n> - bullet\n>\n> 2. second\n>no space";
        assert_eq!(
            parse(input),
            vec![Block::Blockquote {
                lines: vec![
                    QuoteLine::Text("plain <em>text</em>".to_string()),
                    QuoteLine::Bullet("bullet".to_string()),
                    QuoteLine::Blank,
                    QuoteLine::Numbered {
                        label: "2".to_string(),
                        text: "second".to_string(),
                    },
                    QuoteLine::Text("no space".to_string()),
                ]
            }]
        );
    }

    #[test]
    fn paragraphs_are_one_per_line() {
        assert_eq!(
            parse("first\nsecond"),
            vec![paragraph("first"), paragraph("second")]
        );
    }

    #[test]
    fn crlf_input_is_trimmed() {
        assert_eq!(
            parse("- a\r\n- b\r\n"),
            vec![list(&["a", "b"])]
        );
    }

    fn quote(text: &str) -> Block {
        Block::Blockquote {
            lines: vec![QuoteLine::Text(text.to_string())],
        }
    }

    fn code(text: &str) -> Block {
        Block::CodeBlock {
            language: None,
            lines: vec![text.to_string()],
        }
    }

    fn table(cell: &str) -> Block {
        Block::Table(Table {
            header: None,
            rows: vec![vec![cell.to_string()]],
        })
    }

    /// Every ordered pair of the four buffered block kinds flushes the first
    /// before the second begins.
    #[rstest]
    #[case("- l", list(&["l"]), "> q", quote("q"))]
    #[case("- l", list(&["l"]), "| t |", table("t"))]
    #[case("- l", list(&["l"]), "```\nc\n```", code("c"))]
    #[case("> q", quote("q"), "- l", list(&["l"]))]
    #[case("> q", quote("q"), "| t |", table("t"))]
    #[case("> q", quote("q"), "```\nc\n```", code("c"))]
    #[case("| t |", table("t"), "- l", list(&["l"]))]
    #[case("| t |", table("t"), "> q", quote("q"))]
    #[case("| t |", table("t"), "```\nc\n```", code("c"))]
    #[case("```\nc\n```", code("c"), "- l", list(&["l"]))]
    #[case("```\nc\n```", code("c"), "> q", quote("q"))]
    #[case("```\nc\n```", code("c"), "| t |", table("t"))]
    fn open_blocks_are_mutually_exclusive(
        #[case] first: &str,
        #[case] first_block: Block,
        #[case] second: &str,
        #[case] second_block: Block,
    ) {
        let input = format!("{first}\n{second}");
        assert_eq!(parse(&input), vec![first_block, second_block]);
    }
}
