//! Plain-text helpers shared by the webhook handlers and the API.

/// Public identifier of a node: lower-cased name with spaces removed.
pub fn name_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}

/// Escapes text for embedding in HTML, quotes included.
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Resolves named and numeric character references the way browsers do.
/// Unknown references are left as they are.
pub fn html_unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        result.push_str(&rest[..start]);
        let candidate = &rest[start..];

        let decoded = candidate
            .find(';')
            .filter(|&end| end > 1 && end <= MAX_REFERENCE_LENGTH)
            .and_then(|end| decode_reference(&candidate[1..end]).map(|decoded| (decoded, end)));

        match decoded {
            Some((decoded, end)) => {
                result.push_str(&decoded);
                rest = &candidate[end + 1..];
            }
            None => {
                result.push('&');
                rest = &candidate[1..];
            }
        }
    }

    result.push_str(rest);
    result
}

/// Longest named reference is `&CounterClockwiseContourIntegral;`.
const MAX_REFERENCE_LENGTH: usize = 40;

fn decode_reference(reference: &str) -> Option<String> {
    if let Some(number) = reference.strip_prefix('#') {
        let (digits, radix) = match number.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16),
            None => (number, 10),
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        let code = u32::from_str_radix(digits, radix).unwrap_or(u32::MAX);
        return Some(decode_code_point(code));
    }

    let entity = format!("&{reference};");
    let decoded = html_escape::decode_html_entities(&entity);
    if decoded == entity {
        None
    } else {
        Some(decoded.into_owned())
    }
}

/// Numeric references follow the HTML5 parser: C1 controls are read as
/// Windows-1252, invalid values become U+FFFD and forbidden code points are
/// dropped.
fn decode_code_point(code: u32) -> String {
    if let Some(c) = windows_1252(code) {
        return c.to_string();
    }
    if code == 0 || (0xD800..=0xDFFF).contains(&code) || code > 0x10FFFF {
        return '\u{FFFD}'.to_string();
    }
    if is_forbidden_code_point(code) {
        return String::new();
    }
    char::from_u32(code).map(String::from).unwrap_or_default()
}

fn is_forbidden_code_point(code: u32) -> bool {
    matches!(code, 0x1..=0x8 | 0xB | 0xE..=0x1F | 0x7F..=0x9F | 0xFDD0..=0xFDEF)
        || matches!(code & 0xFFFF, 0xFFFE | 0xFFFF)
}

fn windows_1252(code: u32) -> Option<char> {
    let c = match code {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => return None,
    };
    Some(c)
}

/// Hashtags in `text`, lower-cased and without the `#`.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tags = Vec::new();
    let mut chars = lowered.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '#' {
            continue;
        }
        let mut tag = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                tag.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if !tag.is_empty() {
            tags.push(tag);
        }
    }

    tags
}

/// Ratcliff/Obershelp similarity in `[0, 1]`: twice the number of matching
/// characters over the total length of both strings.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matches = matching_characters(&a, &b, 0, a.len(), 0, b.len());
    2.0 * matches as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> usize {
    let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
    if size == 0 {
        return 0;
    }

    size + matching_characters(a, b, alo, i, blo, j)
        + matching_characters(a, b, i + size, ahi, j + size, bhi)
}

/// Longest common block, earliest in `a` then earliest in `b` on ties.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    let mut previous = vec![0usize; b.len() + 1];

    for i in alo..ahi {
        let mut current = vec![0usize; b.len() + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let size = previous[j] + 1;
                current[j + 1] = size;
                if size > best_size {
                    best_i = i + 1 - size;
                    best_j = j + 1 - size;
                    best_size = size;
                }
            }
        }
        previous = current;
    }

    (best_i, best_j, best_size)
}
