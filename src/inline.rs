//! Inline formatting: escaping plus code, bold and italic spans.
//!
//! Emphasis is resolved with a delimiter stack rather than ordered
//! substitutions. A run of `*` or `_` closes the nearest open run of the same
//! character. When both runs are at least two long, two characters are
//! consumed and the span becomes `<strong>`; otherwise one character is
//! consumed and the span becomes `<em>`. Leftover characters keep closing
//! further openers and are pushed as a new opener when nothing matches.
//! Openers still open at the end of the line are emitted literally.

/// Escape the characters that are significant in markup.
///
/// Not idempotent: `&amp;` becomes `&amp;amp;`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Format a single line of text into safe inline markup.
pub fn format_inline(line: &str) -> String {
    let chars: Vec<char> = escape(line).chars().collect();
    let mut spans = SpanStack::default();
    let mut text = String::new();

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '`' => {
                if let Some(close) = closing_backtick(&chars, i) {
                    spans.flush_text(&mut text);
                    let code: String = chars[i + 1..close].iter().collect();
                    spans.push_markup(format!("<code>{code}</code>"));
                    i = close + 1;
                    continue;
                }
                text.push(ch);
            }
            '*' | '_' => {
                let start = i;
                while i < chars.len() && chars[i] == ch {
                    i += 1;
                }
                spans.flush_text(&mut text);
                spans.delimiter_run(ch, i - start);
                continue;
            }
            _ => text.push(ch),
        }
        i += 1;
    }

    spans.flush_text(&mut text);
    spans.finish()
}

/// Index of the backtick closing a non-empty code span opened at `open`.
fn closing_backtick(chars: &[char], open: usize) -> Option<usize> {
    let close = open + 1 + chars[open + 1..].iter().position(|&c| c == '`')?;
    (close > open + 1).then_some(close)
}

enum Piece {
    /// Already-safe markup.
    Markup(String),
    /// A delimiter run that has not (fully) matched yet.
    Delim { ch: char, count: usize },
}

impl Piece {
    fn into_markup(self) -> String {
        match self {
            Piece::Markup(markup) => markup,
            Piece::Delim { ch, count } => std::iter::repeat_n(ch, count).collect(),
        }
    }
}

#[derive(Default)]
struct SpanStack {
    pieces: Vec<Piece>,
    // Indices into `pieces` of delimiter runs that may still open a span
    openers: Vec<usize>,
}

impl SpanStack {
    fn flush_text(&mut self, text: &mut String) {
        if !text.is_empty() {
            self.pieces.push(Piece::Markup(std::mem::take(text)));
        }
    }

    fn push_markup(&mut self, markup: String) {
        self.pieces.push(Piece::Markup(markup));
    }

    fn delimiter_run(&mut self, ch: char, mut count: usize) {
        while count > 0 {
            let Some(slot) = self
                .openers
                .iter()
                .rposition(|&idx| matches!(self.pieces[idx], Piece::Delim { ch: c, .. } if c == ch))
            else {
                break;
            };
            let idx = self.openers[slot];
            if idx + 1 == self.pieces.len() {
                // Nothing between the runs
                break;
            }

            let used = match &mut self.pieces[idx] {
                Piece::Delim { count: open, .. } => {
                    let used = if *open >= 2 && count >= 2 { 2 } else { 1 };
                    *open -= used;
                    used
                }
                Piece::Markup(_) => break,
            };

            // Openers above the match are abandoned and stay literal
            self.openers.truncate(slot + 1);

            let inner: String = self.pieces.drain(idx + 1..).map(Piece::into_markup).collect();
            if matches!(self.pieces[idx], Piece::Delim { count: 0, .. }) {
                self.pieces.pop();
                self.openers.pop();
            }

            let tag = if used == 2 { "strong" } else { "em" };
            self.pieces.push(Piece::Markup(format!("<{tag}>{inner}</{tag}>")));
            count -= used;
        }

        if count > 0 {
            self.openers.push(self.pieces.len());
            self.pieces.push(Piece::Delim { ch, count });
        }
    }

    fn finish(self) -> String {
        self.pieces.into_iter().map(Piece::into_markup).collect()
    }
}
