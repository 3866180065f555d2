/// Common test utilities and helpers for fork-purger tests
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub const ACCOUNT: &str = "alice";

/// Mock GitHub repository data for testing
#[derive(Debug, Clone)]
pub struct MockRepository {
    pub name: String,
    pub created_days_ago: i64,
    pub is_fork: bool,
}

#[allow(dead_code)]
impl MockRepository {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            created_days_ago: 30,
            is_fork: false,
        }
    }

    pub fn with_age_days(mut self, days: i64) -> Self {
        self.created_days_ago = days;
        self
    }

    pub fn as_fork(mut self) -> Self {
        self.is_fork = true;
        self
    }

    /// Listing payload as returned by `GET /users/{account}/repos`
    pub fn to_json(&self, id: u64) -> Value {
        let created_at = (Utc::now() - Duration::days(self.created_days_ago))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();

        json!({
            "id": id,
            "node_id": format!("R_{}", id),
            "name": self.name,
            "full_name": format!("{}/{}", ACCOUNT, self.name),
            "owner": owner_json(),
            "private": false,
            "fork": self.is_fork,
            "url": format!("https://api.github.com/repos/{}/{}", ACCOUNT, self.name),
            "html_url": format!("https://github.com/{}/{}", ACCOUNT, self.name),
            "created_at": created_at,
            "updated_at": created_at,
            "pushed_at": created_at
        })
    }
}

fn owner_json() -> Value {
    json!({
        "login": ACCOUNT,
        "id": 78910,
        "node_id": "MDQ6VXNlcjc4OTEw",
        "avatar_url": "https://avatars.githubusercontent.com/u/78910?v=4",
        "gravatar_id": "",
        "url": "https://api.github.com/users/alice",
        "html_url": "https://github.com/alice",
        "followers_url": "https://api.github.com/users/alice/followers",
        "following_url": "https://api.github.com/users/alice/following{/other_user}",
        "gists_url": "https://api.github.com/users/alice/gists{/gist_id}",
        "starred_url": "https://api.github.com/users/alice/starred{/owner}{/repo}",
        "subscriptions_url": "https://api.github.com/users/alice/subscriptions",
        "organizations_url": "https://api.github.com/users/alice/orgs",
        "repos_url": "https://api.github.com/users/alice/repos",
        "events_url": "https://api.github.com/users/alice/events{/privacy}",
        "received_events_url": "https://api.github.com/users/alice/received_events",
        "type": "User",
        "site_admin": false,
        "patch_url": null,
        "email": null
    })
}

/// Test data sets for common scenarios
pub struct TestDataSets;

#[allow(dead_code)]
impl TestDataSets {
    /// Fork@100d, fork@10d, non-fork@200d: only the first is stale
    pub fn alice_repositories() -> Vec<MockRepository> {
        vec![
            MockRepository::new("old-fork").with_age_days(100).as_fork(),
            MockRepository::new("new-fork").with_age_days(10).as_fork(),
            MockRepository::new("old-source").with_age_days(200),
        ]
    }
}

fn page_body(repos: &[MockRepository], first_id: u64) -> Value {
    Value::Array(
        repos
            .iter()
            .enumerate()
            .map(|(i, repo)| repo.to_json(first_id + i as u64))
            .collect(),
    )
}

/// Mount one listing page per entry; every page but the last links to the next
#[allow(dead_code)]
pub async fn mount_listing(server: &MockServer, pages: &[Vec<MockRepository>]) {
    let route = format!("/users/{}/repos", ACCOUNT);
    let mut first_id = 1u64;

    for (index, repos) in pages.iter().enumerate() {
        let page = index + 1;
        let mut response = ResponseTemplate::new(200).set_body_json(page_body(repos, first_id));

        if page < pages.len() {
            let link = format!(
                "<{}{}?per_page=100&page={}>; rel=\"next\", <{}{}?per_page=100&page={}>; rel=\"last\"",
                server.uri(),
                route,
                page + 1,
                server.uri(),
                route,
                pages.len()
            );
            response = response.insert_header("Link", link.as_str());
        }

        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .and(query_param("page", page.to_string().as_str()))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;

        first_id += repos.len() as u64;
    }
}

/// Mount a successful delete for `alice/{name}`, expected exactly `times` times
#[allow(dead_code)]
pub async fn mount_delete(server: &MockServer, name: &str, times: u64) {
    Mock::given(method("DELETE"))
        .and(path(format!("/repos/{}/{}", ACCOUNT, name).as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(times)
        .mount(server)
        .await;
}

/// Mount a rejected delete for `alice/{name}`
#[allow(dead_code)]
pub async fn mount_forbidden_delete(server: &MockServer, name: &str) {
    Mock::given(method("DELETE"))
        .and(path(format!("/repos/{}/{}", ACCOUNT, name).as_str()))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "Must have admin rights to Repository.",
            "documentation_url": "https://docs.github.com/rest/repos/repos#delete-a-repository"
        })))
        .expect(1)
        .mount(server)
        .await;
}
