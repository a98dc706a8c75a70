//! Session field extraction from the portal's device-listing markup.
//!
//! The portal has no API for handing out session tokens. After login, the
//! device page embeds them as hidden form fields:
//!
//! ```html
//! <input type="hidden" id="token" value="...">
//! <input type="hidden" name="devId" value="...">
//! ```
//!
//! This is the most fragile boundary against portal changes, so it is a
//! pure function over the raw markup with no network code involved.

use std::sync::LazyLock;

use regex_lite::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<([a-zA-Z][a-zA-Z0-9]*)\b([^>]*)>").expect("TAG_RE should compile")
});
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("ATTR_RE should compile")
});

/// The token/device-id pair that makes a session usable.
///
/// Both values are always present together; there is no way to build a
/// half-populated session from markup.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionFields {
    pub token: String,
    pub device_id: String,
}

impl std::fmt::Debug for SessionFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFields")
            .field("token", &"[REDACTED]")
            .field("device_id", &self.device_id)
            .finish()
    }
}

/// Extract the session token and device id from device-page markup.
///
/// - token: `value` of the first element whose `id` is exactly `token`
/// - device id: `value` of the first `<input>` whose `name` is exactly `devId`
///
/// Returns `None` unless both are found with non-empty values.
pub fn extract_session_fields(markup: &str) -> Option<SessionFields> {
    let mut token: Option<String> = None;
    let mut device_id: Option<String> = None;

    for tag in TAG_RE.captures_iter(markup) {
        let name = tag.get(1).map_or("", |m| m.as_str());
        let attrs = parse_attributes(tag.get(2).map_or("", |m| m.as_str()));

        if token.is_none() && attr(&attrs, "id") == Some("token") {
            token = attr(&attrs, "value").map(decode_entities);
        }

        if device_id.is_none()
            && name.eq_ignore_ascii_case("input")
            && attr(&attrs, "name") == Some("devId")
        {
            device_id = attr(&attrs, "value").map(decode_entities);
        }

        if token.is_some() && device_id.is_some() {
            break;
        }
    }

    match (token, device_id) {
        (Some(token), Some(device_id)) if !token.is_empty() && !device_id.is_empty() => {
            Some(SessionFields { token, device_id })
        }
        _ => None,
    }
}

fn parse_attributes(raw: &str) -> Vec<(String, &str)> {
    ATTR_RE
        .captures_iter(raw)
        .filter_map(|cap| {
            let name = cap.get(1)?.as_str().to_ascii_lowercase();
            let value = cap.get(2).or_else(|| cap.get(3)).or_else(|| cap.get(4))?;
            Some((name, value.as_str()))
        })
        .collect()
}

fn attr<'a>(attrs: &[(String, &'a str)], name: &str) -> Option<&'a str> {
    attrs.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
}

fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_owned();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
