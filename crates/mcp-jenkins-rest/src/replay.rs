//! Extracts pipeline scripts from a build's `replay` page.
//!
//! The replay page is HTML, not JSON. Each script is the body of a
//! `<textarea>` whose `name` looks like `_.mainScript` or
//! `_.additionalScripts`.

use std::sync::LazyLock;

use regex::Regex;

/// Attributes may hold `>` inside quoted values
static TEXTAREA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<textarea\b((?:"[^"]*"|'[^']*'|[^'">])*)>(.*?)</textarea\s*>"#)
        .expect("valid textarea regex")
});

static NAME_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)name\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid name attribute regex")
});

static SCRIPT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_\..*Script.*").expect("valid script name regex"));

/// Returns the script bodies in document order. A page without matching
/// textareas yields an empty list.
pub fn extract_scripts(html: &str) -> Vec<String> {
    TEXTAREA
        .captures_iter(html)
        .filter(|caps| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            NAME_ATTR
                .captures(attrs)
                .and_then(|name| name.get(1).or(name.get(2)).or(name.get(3)))
                .is_some_and(|name| SCRIPT_NAME.is_match(name.as_str()))
        })
        .map(|caps| decode_entities(caps.get(2).map_or("", |m| m.as_str())))
        .collect()
}

/// Decodes the entities Jenkins emits inside textarea bodies
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
