//! Public object URL construction and parsing.
//!
//! Stored images are referenced from the collection document by their public
//! URL, so deleting one means recovering the bucket path from that URL.

use reqwest::Url;

/// Public URL of an object: `{base}/storage/v1/object/public/{bucket}/{path}`.
pub fn public_object_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{bucket}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Recover the bucket path from a public object URL.
///
/// Everything after the first path segment equal to `bucket` is the object
/// path. Returns `None` for unparsable URLs, URLs that do not mention the
/// bucket, or URLs with nothing after it.
pub fn object_path_from_url(url: &str, bucket: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.collect();
    let index = segments.iter().position(|s| *s == bucket)?;
    let rest: Vec<&str> = segments[index + 1..]
        .iter()
        .copied()
        .filter(|s| !s.is_empty())
        .collect();
    if rest.is_empty() {
        return None;
    }
    Some(rest.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_layout() {
        assert_eq!(
            public_object_url("https://abc.supabase.co/", "dino-images", "u-1/x.png"),
            "https://abc.supabase.co/storage/v1/object/public/dino-images/u-1/x.png"
        );
    }

    #[test]
    fn path_round_trips_through_public_url() {
        let url = public_object_url("https://abc.supabase.co", "dino-images", "u-1/k3j9.png");
        assert_eq!(
            object_path_from_url(&url, "dino-images").as_deref(),
            Some("u-1/k3j9.png")
        );
    }

    #[test]
    fn unknown_bucket_or_garbage_yields_none() {
        assert!(object_path_from_url("https://abc.supabase.co/other/u-1/x.png", "dino-images").is_none());
        assert!(object_path_from_url("not a url", "dino-images").is_none());
        assert!(object_path_from_url("https://abc.supabase.co/dino-images/", "dino-images").is_none());
    }

    #[test]
    fn query_string_is_not_part_of_path() {
        assert_eq!(
            object_path_from_url(
                "https://abc.supabase.co/storage/v1/object/public/dino-images/u-1/x.png?t=1",
                "dino-images"
            )
            .as_deref(),
            Some("u-1/x.png")
        );
    }
}
