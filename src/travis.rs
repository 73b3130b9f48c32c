use chrono::{DateTime, Utc};

use crate::{
    build::{Build, BuildState, Commit},
    error::Result,
    transport::{self, Headers, Transport, header},
};

#[derive(Debug, serde::Deserialize, PartialEq)]
struct ReposResponse {
    repos: Vec<TravisRepo>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct TravisRepo {
    id: u64,
    slug: String,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct BuildsResponse {
    builds: Vec<TravisBuild>,
    commits: Vec<TravisCommit>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct TravisBuild {
    commit_id: u64,
    state: String,
    started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct TravisCommit {
    id: u64,
    branch: String,
    sha: Option<String>,
    committed_at: Option<DateTime<Utc>>,
    author_name: Option<String>,
}

impl TravisRepo {
    /// The slug without its owner prefix.
    fn name(&self) -> &str {
        match self.slug.split_once('/') {
            Some((_, name)) => name,
            None => &self.slug,
        }
    }
}

impl BuildsResponse {
    fn to_builds(&self, repository: &str) -> Vec<Build> {
        self.builds
            .iter()
            .filter_map(|build| {
                let Some(commit) = self.commits.iter().find(|c| c.id == build.commit_id) else {
                    tracing::warn!(
                        repository,
                        commit_id = build.commit_id,
                        "build references an unknown commit, skipping"
                    );
                    return None;
                };
                Some(Build {
                    repository: repository.to_string(),
                    branch: commit.branch.clone(),
                    started: build.started_at,
                    state: BuildState::from_travis(&build.state),
                    commit: Commit {
                        created: commit.committed_at,
                        author: commit.author_name.clone(),
                        hash: commit.sha.clone(),
                    },
                })
            })
            .collect()
    }
}

fn travis_headers(token: Option<&str>) -> Headers {
    let mut headers = vec![header("Accept", "application/vnd.travis-ci.2+json")];
    if let Some(t) = token {
        headers.push(header("Authorization", format!("token {t}")));
    }
    headers
}

async fn fetch_repository(
    transport: &dyn Transport,
    server_url: &str,
    repo: &TravisRepo,
    headers: &Headers,
) -> Result<Vec<Build>> {
    let url = format!("{server_url}/{}/builds", repo.slug);
    let response = transport::request::<BuildsResponse>(transport, &url, headers).await?;
    let builds = response.to_builds(repo.name());
    tracing::debug!(repo.id, slug = %repo.slug, builds = builds.len(), "travis builds");
    Ok(builds)
}

/// Lists the repositories, then fetches every repository's builds at once.
/// Resolves once all of them are in, or with the first failure.
pub async fn fetch(
    transport: &dyn Transport,
    server_url: &str,
    token: Option<&str>,
) -> Result<Vec<Build>> {
    let headers = travis_headers(token);
    let listing = transport::request::<ReposResponse>(transport, server_url, &headers).await?;
    let requests = listing
        .repos
        .iter()
        .map(|repo| fetch_repository(transport, server_url, repo, &headers));
    let per_repository = futures::future::try_join_all(requests).await?;
    Ok(per_repository
        .into_iter()
        .filter(|builds| !builds.is_empty())
        .flatten()
        .collect())
}
