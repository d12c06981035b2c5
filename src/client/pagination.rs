/// Returns the `rel="next"` target of a `Link` header, if any.
///
/// The header looks like
/// `<https://api.github.com/orgs/acme/repos?page=2>; rel="next", <...?page=5>; rel="last"`.
pub fn next_link(link_header: &str) -> Option<String> {
    for part in link_header.split(',') {
        let mut url = None;
        let mut is_next = false;

        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel) = segment.strip_prefix("rel=") {
                is_next = rel.trim_matches('"').split_whitespace().any(|r| r == "next");
            }
        }

        if let (Some(url), true) = (url, is_next) {
            return Some(url.to_string());
        }
    }

    None
}
