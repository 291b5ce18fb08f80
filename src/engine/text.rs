const SPACE_VARIANTS: [char; 5] = ['\u{00A0}', '\u{2007}', '\u{2009}', '\u{200A}', '\u{202F}'];

/// Canonical page text: space variants become plain spaces, `-\n` wraps are
/// joined and runs of spaces/tabs collapse to one space. Newlines are kept.
pub fn canonicalize_page_text(raw: &str) -> String {
    let spaced = raw.replace("\r\n", "\n").replace(&SPACE_VARIANTS[..], " ");
    let unwrapped = spaced.replace("-\n", "");
    collapse_horizontal_whitespace(&unwrapped)
}

pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn collapse_horizontal_whitespace(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_run = false;

    for character in input.chars() {
        if character == ' ' || character == '\t' {
            if !in_run {
                output.push(' ');
            }
            in_run = true;
        } else {
            output.push(character);
            in_run = false;
        }
    }

    output
}

/// The slice from `pad` characters before `start` to `pad` characters after `end`.
/// `start` and `end` must be char boundaries of `text`.
pub fn char_window(text: &str, start: usize, end: usize, pad: usize) -> &str {
    let lower = if pad == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .take(pad)
            .last()
            .map(|(index, _)| index)
            .unwrap_or(start)
    };
    let upper = text[end..]
        .char_indices()
        .nth(pad)
        .map(|(index, _)| end + index)
        .unwrap_or(text.len());

    &text[lower..upper]
}
