use crate::host::FieldKind;

pub(super) fn generic_cleaner(kind: FieldKind) -> fn(&str) -> String {
    match kind {
        FieldKind::Email => clean_email,
        FieldKind::Tel => clean_tel,
        FieldKind::Number => clean_number,
        FieldKind::Url => clean_url,
        FieldKind::Text => clean_text,
        FieldKind::Textarea => clean_textarea,
        FieldKind::Other => clean_fallback,
    }
}

fn clean_text(raw: &str) -> String {
    collapse_whitespace(raw)
}

// Line breaks are content in a textarea; only horizontal runs collapse.
fn clean_textarea(raw: &str) -> String {
    raw.trim()
        .lines()
        .map(|line| {
            line.split(|c: char| c == ' ' || c == '\t')
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn clean_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn clean_tel(raw: &str) -> String {
    raw.trim()
        .chars()
        .enumerate()
        .filter(|(index, c)| c.is_ascii_digit() || (*index == 0 && *c == '+'))
        .map(|(_, c)| c)
        .collect()
}

fn clean_number(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

fn clean_url(raw: &str) -> String {
    raw.trim().to_string()
}

fn clean_fallback(raw: &str) -> String {
    raw.trim().to_string()
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
