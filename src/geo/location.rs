use url::Url;

use super::Coordinates;

/// Outcome of extracting coordinates from a pasted map link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationLookup {
    Found(Coordinates),
    NotFound,
}

impl LocationLookup {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            LocationLookup::Found(c) => Some(*c),
            LocationLookup::NotFound => None,
        }
    }
}

/// Extract coordinates from a maps link.
///
/// Two shapes are recognized, in this order: `@lat,lng` (place/viewport
/// links such as `.../@24.7,46.6,15z`) and a `q=lat,lng` query parameter
/// introduced by `?` or `&`.
pub fn parse_location_url(url: &str) -> LocationLookup {
    let url = url.trim();

    let found = after_each(url, "@")
        .find_map(parse_pair)
        .or_else(|| {
            after_each(url, "?q=")
                .chain(after_each(url, "&q="))
                .find_map(parse_pair)
        });

    match found {
        Some(c) => LocationLookup::Found(c),
        None => LocationLookup::NotFound,
    }
}

/// A pasted link that may be rendered as an `href`: absolute `http` or `https` only.
pub fn web_link(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Some(url),
        _ => None,
    }
}

/// Every suffix of `haystack` that directly follows an occurrence of `marker`.
fn after_each<'a>(haystack: &'a str, marker: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    haystack
        .match_indices(marker)
        .map(move |(i, m)| &haystack[i + m.len()..])
}

/// `<number>,<number>` at the start of `s`.
fn parse_pair(s: &str) -> Option<Coordinates> {
    let (lat, rest) = take_number(s)?;
    let rest = rest.strip_prefix(',')?;
    let (lng, _) = take_number(rest)?;
    Coordinates::checked(lat, lng)
}

/// Optional minus, one or more digits, optionally a dot followed by digits.
fn take_number(s: &str) -> Option<(f64, &str)> {
    let bytes = s.as_bytes();
    let mut end = 0;

    if bytes.first() == Some(&b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == int_start {
        return None;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    let value = s[..end].trim_end_matches('.').parse::<f64>().ok()?;
    Some((value, &s[end..]))
}
