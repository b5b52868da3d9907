use std::ops::Range;

/// Escape text for insertion into HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode the small set of entities an essay realistically contains.
///
/// Named: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
/// Numeric references decode only when semicolon-terminated and a valid
/// Unicode scalar (`&#39;`, `&#x2019;`). Everything else passes through
/// unchanged.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match decode_one(candidate) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// Max length of a reference we try to decode, `&#x10FFFF;` included.
const MAX_ENTITY_LEN: usize = 10;

fn decode_one(candidate: &str) -> Option<(char, usize)> {
    let window_end = candidate
        .char_indices()
        .take(MAX_ENTITY_LEN + 1)
        .find(|(_, c)| *c == ';')
        .map(|(i, _)| i)?;
    let body = &candidate[1..window_end];
    let consumed = window_end + 1;

    let decoded = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let digits = body.strip_prefix('#')?;
            let value = match digits.strip_prefix(['x', 'X']) {
                Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                    u32::from_str_radix(hex, 16).ok()?
                }
                None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                    digits.parse::<u32>().ok()?
                }
                _ => return None,
            };
            char::from_u32(value)?
        }
    };
    Some((decoded, consumed))
}

fn is_reference_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'#'
}

/// Span of the `&...;` reference that strictly contains byte `pos`, i.e.
/// a cut at `pos` would split the reference. Cuts at the `&` itself or
/// just past the `;` are not inside.
pub fn entity_containing(text: &str, pos: usize) -> Option<Range<usize>> {
    let bytes = text.as_bytes();
    if pos == 0 || pos >= bytes.len() {
        return None;
    }
    let window_start = pos.saturating_sub(MAX_ENTITY_LEN);
    let amp = (window_start..pos).rev().find(|&i| bytes[i] == b'&')?;
    if !bytes[amp + 1..pos].iter().all(|&b| is_reference_byte(b)) {
        return None;
    }
    let window_end = (amp + MAX_ENTITY_LEN + 1).min(bytes.len());
    let semi = (pos..window_end).find(|&i| !is_reference_byte(bytes[i]))?;
    (bytes[semi] == b';' && semi > amp + 1).then_some(amp..semi + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_covers_significant_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_decode_named_and_numeric() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("it&#039;s &#x2019;"), "it's \u{2019}");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{a0}b");
    }

    #[test]
    fn test_decode_leaves_malformed_references() {
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
        assert_eq!(decode_entities("&#xZZ;"), "&#xZZ;");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }

    #[test]
    fn test_entity_containing() {
        let text = "Salt &amp; pepper";
        assert_eq!(entity_containing(text, 6), Some(5..10));
        assert_eq!(entity_containing(text, 9), Some(5..10));
        assert_eq!(entity_containing(text, 5), None);
        assert_eq!(entity_containing(text, 10), None);
        assert_eq!(entity_containing("AT&T rocks", 3), None);
        assert_eq!(entity_containing("&lt;&amp;", 4), None);
    }
}
