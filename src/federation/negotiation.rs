//! ActivityPub media type matching
//!
//! Decides whether an `Accept` or `Content-Type` header names one of the
//! two media types peers use for ActivityStreams documents.

/// Dedicated ActivityPub media type
pub const ACTIVITY_JSON: &str = "application/activity+json";

/// JSON-LD media type, admitted only with the ActivityStreams profile
pub const LD_JSON: &str = "application/ld+json";

/// ActivityStreams namespace, also the required `profile` parameter
pub const ACTIVITYSTREAMS_NS: &str = "https://www.w3.org/ns/activitystreams";

/// JRD media type used by webfinger responses
pub const JRD_JSON: &str = "application/jrd+json";

/// Whether a single media range is an ActivityPub media type
///
/// Type and parameter names compare case-insensitively; the profile
/// value must match exactly, quoted or not.
pub fn is_activity_media_type(value: &str) -> bool {
    let mut parts = value.split(';').map(str::trim);
    let essence = match parts.next() {
        Some(essence) if !essence.is_empty() => essence,
        _ => return false,
    };

    if essence.eq_ignore_ascii_case(ACTIVITY_JSON) {
        return true;
    }
    if !essence.eq_ignore_ascii_case(LD_JSON) {
        return false;
    }

    parts.any(|param| {
        let Some((name, value)) = param.split_once('=') else {
            return false;
        };
        name.trim().eq_ignore_ascii_case("profile")
            && value.trim().trim_matches('"') == ACTIVITYSTREAMS_NS
    })
}

/// Whether any entry of an `Accept` list is an ActivityPub media type
pub fn accepts_activity_json(accept: &str) -> bool {
    split_media_ranges(accept).any(is_activity_media_type)
}

/// Split a header list on commas that are not inside a quoted string
fn split_media_ranges(header: &str) -> impl Iterator<Item = &str> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut quoted = false;

    for (index, ch) in header.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                ranges.push(&header[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    ranges.push(&header[start..]);

    ranges.into_iter().map(str::trim).filter(|range| !range.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_activity_json() {
        assert!(is_activity_media_type("application/activity+json"));
        assert!(is_activity_media_type("Application/Activity+JSON"));
        assert!(is_activity_media_type("application/activity+json; charset=utf-8"));
    }

    #[test]
    fn admits_ld_json_with_profile() {
        assert!(is_activity_media_type(
            r#"application/ld+json; profile="https://www.w3.org/ns/activitystreams""#
        ));
        assert!(is_activity_media_type(
            r#"application/ld+json;profile="https://www.w3.org/ns/activitystreams""#
        ));
        assert!(is_activity_media_type(
            "application/ld+json; profile=https://www.w3.org/ns/activitystreams"
        ));
    }

    #[test]
    fn rejects_other_types() {
        assert!(!is_activity_media_type("application/json"));
        assert!(!is_activity_media_type("text/html"));
        assert!(!is_activity_media_type("application/ld+json"));
        assert!(!is_activity_media_type(
            r#"application/ld+json; profile="https://example.com/other""#
        ));
        assert!(!is_activity_media_type(""));
        assert!(!is_activity_media_type("*/*"));
    }

    #[test]
    fn accept_lists_match_any_entry() {
        assert!(accepts_activity_json(
            "text/html, application/activity+json;q=0.9"
        ));
        assert!(accepts_activity_json(
            r#"application/ld+json; profile="https://www.w3.org/ns/activitystreams", text/html"#
        ));
        assert!(!accepts_activity_json("text/html, application/json"));
    }
}
