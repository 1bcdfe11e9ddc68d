use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use url::Url;

/// Deterministic file name for a downloaded image: `{short_hash(path)}-{name}`.
///
/// The hash covers the URL without its query string, so the same upload keeps
/// the same name even though the store signs each download URL differently.
/// Uploads tend to share names like `Untitled.png`; the hash keeps them apart.
pub fn image_filename(url: &Url, content_type: Option<&str>) -> String {
    let mut stable = url.clone();
    stable.set_query(None);
    stable.set_fragment(None);
    let hash = short_hash(stable.as_str());

    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(sanitize_segment)
        .filter(|name| !name.is_empty());

    match segment {
        Some(name) if name.contains('.') => format!("{hash}-{name}"),
        Some(name) => match extension_for(content_type) {
            Some(ext) => format!("{hash}-{name}.{ext}"),
            None => format!("{hash}-{name}"),
        },
        None => {
            let ext = extension_for(content_type).unwrap_or("img");
            format!("image-{hash}.{ext}")
        }
    }
}

/// Percent-decoded, anything outside `[A-Za-z0-9._-]` becomes `_`, runs of
/// `_` collapse, at most 80 bytes.
fn sanitize_segment(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let mapped: String = decoded
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' => c,
            _ => '_',
        })
        .collect();
    let mut name = mapped
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .trim_matches('.')
        .to_string();
    name.truncate(80);
    name
}

fn extension_for(content_type: Option<&str>) -> Option<&'static str> {
    let mime = content_type?.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

fn short_hash(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .take(4)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::image_filename;
    use url::Url;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn keeps_last_segment_and_ignores_signature() {
        let first = image_filename(
            &url("https://s3.example.com/space/abc/Untitled.png?X-Amz-Signature=1"),
            None,
        );
        let second = image_filename(
            &url("https://s3.example.com/space/abc/Untitled.png?X-Amz-Signature=2"),
            Some("image/png"),
        );
        assert_eq!(first, second);
        assert!(first.ends_with("-Untitled.png"), "{first}");
        assert_eq!(first.len(), 8 + 1 + "Untitled.png".len());
    }

    #[test]
    fn same_name_in_different_uploads_differs() {
        let a = image_filename(&url("https://s3.example.com/space/a/image.png"), None);
        let b = image_filename(&url("https://s3.example.com/space/b/image.png"), None);
        assert_ne!(a, b);
    }

    #[test]
    fn adds_extension_from_content_type() {
        let name = image_filename(&url("https://cdn.example.com/raw/photo"), Some("image/jpeg"));
        assert!(name.ends_with("-photo.jpg"), "{name}");

        let bare = image_filename(&url("https://cdn.example.com/"), Some("image/webp"));
        assert!(bare.starts_with("image-") && bare.ends_with(".webp"), "{bare}");
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        let name = image_filename(&url("https://cdn.example.com/a/My%20Shot%20(1).png"), None);
        assert!(name.ends_with("-My_Shot_1_.png"), "{name}");
        assert!(!name.contains('%'));
    }
}
