//! Public URL construction.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as-is inside a path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Join a public base URL and a storage key.
///
/// Each key segment is percent-encoded; `/` between segments is kept.
pub fn public_url(base_url: &str, storage_key: &str) -> String {
    let encoded: Vec<String> = storage_key
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect();
    format!("{}/{}", base_url.trim_end_matches('/'), encoded.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_without_double_slash() {
        assert_eq!(
            public_url("https://cdn.example.com/", "images/abc-photojpg.jpg"),
            "https://cdn.example.com/images/abc-photojpg.jpg"
        );
        assert_eq!(
            public_url("https://cdn.example.com/assets", "downloads/x-y.pdf"),
            "https://cdn.example.com/assets/downloads/x-y.pdf"
        );
    }

    #[test]
    fn test_encodes_unsafe_extension_characters() {
        assert_eq!(
            public_url("http://localhost:9000/bucket", "images/t-ab.j g#"),
            "http://localhost:9000/bucket/images/t-ab.j%20g%23"
        );
    }
}
