//! Text preprocessing utilities for sentence segmentation.
//!
//! Normalizes article text (markup removed, whitespace collapsed) and splits
//! it into sentence-sized pieces that platform speech engines can speak
//! reliably.

/// Abbreviations whose trailing period does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "vs", "etc", "e.g", "i.e",
    "approx", "inc", "ltd", "gen", "col", "lt", "sgt", "rev", "u.s",
];

/// Abbreviations that only hold before a number ("No. 5", "Fig. 3").
const NUMBERED_ABBREVIATIONS: &[&str] = &["no", "fig", "vol"];

/// Characters that may trail terminal punctuation inside the same sentence.
const CLOSERS: &[char] = &['"', '\'', ')', ']', '}', '”', '’', '»'];

/// Characters that may precede the first letter of a new sentence.
const OPENERS: &[char] = &['"', '\'', '(', '[', '{', '“', '‘', '«', '¿', '¡'];

/// Strip markup from article text and collapse whitespace.
///
/// Handles:
/// - `<script>` / `<style>` blocks → removed entirely
/// - Any other HTML tag → removed
/// - Common entities (`&amp;`, `&nbsp;`, `&quot;`, ...) → decoded
/// - Runs of whitespace, including newlines → a single space
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let text = strip_tag_block_pair(text, "<script", "</script>");
    let text = strip_tag_block_pair(&text, "<style", "</style>");
    let text = strip_html_tags(&text);
    let text = decode_entities(&text);
    collapse_whitespace(&text)
}

/// Count whitespace-separated words.
#[must_use]
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split normalized text into sentences.
///
/// A boundary is terminal punctuation (`.`, `!`, `?`, possibly repeated and
/// followed by closing quotes or brackets), then whitespace, then a word
/// that starts with an uppercase (or uncased) letter or a digit. Periods
/// after known abbreviations and name initials do not split.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < len {
        if !is_terminal(chars[i]) {
            i += 1;
            continue;
        }

        // Swallow "?!", "..." and trailing closers into this sentence.
        let mut end = i + 1;
        while end < len && (is_terminal(chars[end]) || CLOSERS.contains(&chars[end])) {
            end += 1;
        }

        if end >= len || !chars[end].is_whitespace() {
            i = end;
            continue;
        }

        let mut next = end;
        while next < len && chars[next].is_whitespace() {
            next += 1;
        }

        let is_boundary = next < len
            && starts_sentence(&chars[next..])
            && !(chars[i] == '.'
                && end == i + 1
                && is_abbreviation(&chars[start..i], &chars[next..]));

        if is_boundary {
            push_trimmed(&mut sentences, &chars[start..end]);
            start = next;
            i = next;
        } else {
            i = end;
        }
    }

    if start < len {
        push_trimmed(&mut sentences, &chars[start..]);
    }

    sentences
}

/// Split an overly long sentence at clause boundaries (`,` `;` `:` `—` `–`),
/// falling back to word boundaries for clauses that are still too long.
///
/// `max_chars` counts characters, not bytes.
#[must_use]
pub fn split_long_sentence(sentence: &str, max_chars: usize) -> Vec<String> {
    if sentence.chars().count() <= max_chars {
        return vec![sentence.trim().to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for part in sentence.split_inclusive(&[',', ';', ':', '—', '–'][..]) {
        if !current.is_empty() && char_len(&current) + char_len(part) > max_chars {
            let flushed = std::mem::take(&mut current);
            push_non_empty(&mut chunks, flushed.trim());
        }
        current.push_str(part);
    }
    push_non_empty(&mut chunks, current.trim());

    // If we still have oversized chunks, hard-split at word boundaries
    let mut final_chunks = Vec::new();
    for chunk in chunks {
        if char_len(&chunk) > max_chars {
            final_chunks.extend(hard_split(&chunk, max_chars));
        } else {
            final_chunks.push(chunk);
        }
    }

    final_chunks
}

// ── Internal helpers ───────────────────────────────────────────────

const fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

/// Whether `rest` (starting at a non-whitespace char) opens a sentence.
fn starts_sentence(rest: &[char]) -> bool {
    rest.iter()
        .find(|c| !OPENERS.contains(c))
        .is_some_and(|&c| c.is_numeric() || (c.is_alphabetic() && !c.is_lowercase()))
}

/// Whether the period ending `before` belongs to an abbreviation or a name
/// initial. `after` starts at the word following the period.
fn is_abbreviation(before: &[char], after: &[char]) -> bool {
    let mut words = before
        .split(|c: &char| c.is_whitespace())
        .filter(|w| !w.is_empty())
        .rev()
        .map(trim_openers);
    let Some(word) = words.next() else {
        return false;
    };
    let previous = words.next();
    let next = after
        .split(|c: &char| c.is_whitespace())
        .next()
        .map(trim_openers)
        .unwrap_or_default();

    // "J. K. Rowling", "John F. Kennedy"; never the pronoun "I".
    if is_initial(word) {
        return previous.is_some_and(is_dotted_initial)
            || is_dotted_initial(next)
            || (previous.is_some_and(is_capitalised) && is_capitalised(next));
    }

    let lower = word.iter().collect::<String>().to_lowercase();
    if NUMBERED_ABBREVIATIONS.contains(&lower.as_str()) {
        return next.first().is_some_and(char::is_ascii_digit);
    }
    ABBREVIATIONS.contains(&lower.as_str())
}

fn trim_openers(word: &[char]) -> &[char] {
    let skip = word.iter().take_while(|c| OPENERS.contains(c)).count();
    &word[skip..]
}

fn is_initial(word: &[char]) -> bool {
    matches!(word, [c] if c.is_uppercase() && *c != 'I')
}

fn is_dotted_initial(word: &[char]) -> bool {
    matches!(word, [c, '.'] if c.is_uppercase() && *c != 'I')
}

fn is_capitalised(word: &[char]) -> bool {
    matches!(
        word,
        [first, rest @ ..] if first.is_uppercase() && rest.iter().any(|c| c.is_lowercase())
    )
}

fn push_trimmed(out: &mut Vec<String>, chars: &[char]) {
    let s: String = chars.iter().collect();
    push_non_empty(out, s.trim());
}

fn push_non_empty(out: &mut Vec<String>, s: &str) {
    if !s.is_empty() {
        out.push(s.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last-resort split at word boundaries.
fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && char_len(&current) + 1 + char_len(word) > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Remove all occurrences of `<open_tag…>…<close_tag>` from text
/// (case-insensitive).
///
/// `open_prefix` names a tag like `<script` and matches `<script>`,
/// `<script type="…">`, etc., but not `<scripted>`. An open tag without a
/// matching close is kept.
fn strip_tag_block_pair(text: &str, open_prefix: &str, close_tag: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let haystack = text.to_ascii_lowercase();
    let open_lower = open_prefix.to_ascii_lowercase();
    let close_lower = close_tag.to_ascii_lowercase();

    let mut cursor = 0;

    while cursor < text.len() {
        let Some(open_start) = haystack[cursor..].find(&open_lower) else {
            result.push_str(&text[cursor..]);
            break;
        };
        let abs_open = cursor + open_start;
        let name_end = abs_open + open_lower.len();

        let ends_name = haystack[name_end..]
            .chars()
            .next()
            .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace());

        let close = haystack[abs_open..]
            .find('>')
            .filter(|_| ends_name)
            .and_then(|tag_end_offset| {
                let tag_end = abs_open + tag_end_offset + 1;
                haystack[tag_end..]
                    .find(&close_lower)
                    .map(|close_offset| tag_end + close_offset + close_tag.len())
            });

        match close {
            Some(close_end) => {
                result.push_str(&text[cursor..abs_open]);
                cursor = close_end;
            }
            None => {
                // Not a block, or unterminated: keep as-is and move past.
                result.push_str(&text[cursor..name_end]);
                cursor = name_end;
            }
        }
    }

    result
}

fn strip_html_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' => {
                in_tag = true;
                // Tags separate words ("a<br>b" must not become "ab").
                result.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&mdash;", "—")
        .replace("&ndash;", "–")
        .replace("&hellip;", "…")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !prev_space {
                result.push(' ');
                prev_space = true;
            }
        } else {
            result.push(c);
            prev_space = false;
        }
    }

    result.trim().to_string()
}
