//! Canonical signature formatting shared by extraction, merge and export.

use quick_xml::escape::{partial_escape, unescape};

/// Escape text for use inside a double-quoted XML attribute
pub fn escape_xml(raw: &str) -> String {
    partial_escape(raw).replace('"', "&quot;")
}

/// Resolve XML entities; malformed input is returned unchanged
pub fn unescape_xml(escaped: &str) -> String {
    match unescape(escaped) {
        Ok(text) => text.into_owned(),
        Err(_) => escaped.to_string(),
    }
}

/// Format a single type: no whitespace around generic brackets, array
/// brackets or nested commas, single spaces elsewhere.
pub fn format_type(raw: &str) -> String {
    let fixed = raw.replace("?super", "? super ").replace("?extends", "? extends ");
    let collapsed = fixed.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut out = String::with_capacity(collapsed.len());
    let chars: Vec<char> = collapsed.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let prev = if i > 0 { chars[i - 1] } else { ' ' };
            let next = chars.get(i + 1).copied().unwrap_or(' ');
            if is_tight(prev) || is_tight(next) || next == '.' {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn is_tight(c: char) -> bool {
    matches!(c, '<' | '>' | ',' | '[' | ']')
}

/// Join parameter types with exactly one space after each top-level comma
pub fn format_parameter_list<'a, I>(types: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    types
        .into_iter()
        .map(format_type)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Normalize a parameter list recovered from free text.
pub fn normalize_parameter_list(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    format_parameter_list(split_top_level(raw))
}

/// Parameter list with top-level separators compacted to `,`
pub fn compact_parameter_list(params: &str) -> String {
    split_top_level(params)
        .into_iter()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(",")
}

/// Split on commas that are not nested inside generic brackets
pub fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

/// Best-effort package of a class name: the leading segments that do not
/// start with an uppercase letter.
pub fn package_of_class(fqn: &str) -> String {
    let segments: Vec<&str> = fqn.split('.').collect();
    let package: Vec<&str> = segments
        .iter()
        .take_while(|s| !s.starts_with(|c: char| c.is_ascii_uppercase()))
        .copied()
        .collect();
    if package.len() == segments.len() {
        segments[..segments.len().saturating_sub(1)].join(".")
    } else {
        package.join(".")
    }
}

/// JVM internal name (`pkg/path/Outer$Inner`)
pub fn internal_name(package: &str, class_path: &[&str]) -> String {
    let nested = class_path.join("$");
    if package.is_empty() {
        nested
    } else {
        format!("{}/{}", package.replace('.', "/"), nested)
    }
}

/// Simple name of a possibly nested class
pub fn simple_name(fqn: &str) -> &str {
    fqn.rsplit('.').next().unwrap_or(fqn)
}
