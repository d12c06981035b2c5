use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use orgshift::client::{Client, RetryPolicy};

/// A client against `server` that retries quickly.
pub fn client(server: &MockServer) -> Client {
    Client::new(
        "random_token",
        &server.uri(),
        RetryPolicy::new(3, Duration::from_millis(5), Duration::from_millis(20)),
        4,
    )
    .unwrap()
}

pub fn repo_json(owner: &str, name: &str) -> Value {
    json!({
        "name": name,
        "full_name": format!("{owner}/{name}"),
        "owner": { "login": owner },
        "default_branch": "main",
        "archived": false,
    })
}

/// One page of a list endpoint, linking to `next_page` when given.
pub fn page_mock(
    server: &MockServer,
    pathname: &str,
    page: u32,
    next_page: Option<u32>,
    items: Value,
) -> Mock {
    let mut response = ResponseTemplate::new(200).set_body_json(items);
    if let Some(next) = next_page {
        let link = format!(
            "<{uri}{pathname}?per_page=100&page={next}>; rel=\"next\", <{uri}{pathname}?per_page=100&page=99>; rel=\"last\"",
            uri = server.uri(),
        );
        response = response.insert_header("link", link.as_str());
    }

    Mock::given(method("GET"))
        .and(path(pathname))
        .and(query_param("page", page.to_string().as_str()))
        .respond_with(response)
        .expect(1)
}

pub fn rate_limited() -> ResponseTemplate {
    ResponseTemplate::new(403)
        .insert_header("x-ratelimit-remaining", "0")
        .insert_header("retry-after", "0")
        .set_body_json(json!({
            "message": "API rate limit exceeded for user ID 1.",
            "documentation_url": "https://docs.github.com/rest/overview/resources-in-the-rest-api#rate-limiting",
        }))
}

pub fn secondary_limited() -> ResponseTemplate {
    ResponseTemplate::new(403).set_body_json(json!({
        "message": "You have exceeded a secondary rate limit. Please wait a few minutes before you try again.",
        "documentation_url": "https://docs.github.com/rest/overview/resources-in-the-rest-api#secondary-rate-limits",
    }))
}
