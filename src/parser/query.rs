//! Query-string decoding.

use std::borrow::Cow;
use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Decode one form-urlencoded component: `+` becomes a space, then percent
/// escapes are resolved. Invalid UTF-8 after unescaping is replaced lossily.
fn decode_component(s: &str) -> String {
    let spaced: Cow<'_, str> = if s.contains('+') {
        Cow::Owned(s.replace('+', " "))
    } else {
        Cow::Borrowed(s)
    };

    if spaced.contains('%') {
        percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
    } else {
        spaced.into_owned()
    }
}

/// Parse a query string into a map of decoded key/value pairs.
///
/// Pairs without `=` map to an empty value. When a key repeats, the last
/// value wins.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }

        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key.is_empty() {
            continue;
        }

        params.insert(decode_component(key), decode_component(value));
    }

    params
}
