//! Public share links.

/// Path segment under which shared collections are served.
pub const SHARE_PATH: &str = "share";

/// The identifier a share link should carry: the alias when one is set,
/// otherwise the raw user id.
pub fn share_identifier<'a>(user_id: &'a str, alias: Option<&'a str>) -> &'a str {
    match alias {
        Some(a) if !a.trim().is_empty() => a,
        _ => user_id,
    }
}

/// Absolute share URL, e.g. `https://example.com/share/my-dinos`.
pub fn share_url(origin: &str, identifier: &str) -> String {
    format!("{}/{SHARE_PATH}/{identifier}", origin.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_wins_over_user_id() {
        assert_eq!(share_identifier("u-1", Some("rexes")), "rexes");
        assert_eq!(share_identifier("u-1", None), "u-1");
        assert_eq!(share_identifier("u-1", Some(" ")), "u-1");
    }

    #[test]
    fn url_has_single_slashes() {
        assert_eq!(
            share_url("https://dinodex.app/", "rexes"),
            "https://dinodex.app/share/rexes"
        );
        assert_eq!(share_url("http://localhost:5173", "u-1"), "http://localhost:5173/share/u-1");
    }
}
