use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
    build::{Build, BuildState, Commit},
    error::Result,
    transport::{self, Transport, header},
};

#[derive(Debug, serde::Deserialize, PartialEq)]
struct CircleProject {
    reponame: String,
    #[serde(default)]
    branches: BTreeMap<String, CircleBranch>,
}

// Circle sends either a missing key or `null` for branches that never built.
#[derive(Debug, serde::Deserialize, PartialEq)]
struct CircleBranch {
    #[serde(default)]
    running_builds: Option<Vec<CircleBuild>>,
    #[serde(default)]
    recent_builds: Option<Vec<CircleBuild>>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct CircleBuild {
    #[serde(default)]
    build_num: u64,
    status: Option<String>,
    outcome: Option<String>,
    pushed_at: Option<DateTime<Utc>>,
    vcs_revision: Option<String>,
}

impl CircleBranch {
    /// The running build with its live status, otherwise the highest
    /// numbered recent build with its outcome.
    fn latest(&self) -> Option<(&CircleBuild, Option<&str>)> {
        let running = self.running_builds.as_deref().unwrap_or_default();
        if let Some(build) = running.first() {
            return Some((build, build.status.as_deref()));
        }
        self.recent_builds
            .as_deref()
            .unwrap_or_default()
            .iter()
            .rev()
            .max_by_key(|b| b.build_num)
            .map(|build| (build, build.outcome.as_deref()))
    }
}

impl CircleBuild {
    fn to_build(&self, repository: &str, branch: &str, status: Option<&str>) -> Build {
        Build {
            repository: repository.to_string(),
            branch: branch.to_string(),
            started: self.pushed_at,
            state: status
                .map(BuildState::from_circle)
                .unwrap_or(BuildState::Unknown),
            commit: Commit {
                created: self.pushed_at,
                author: None,
                hash: self.vcs_revision.clone(),
            },
        }
    }
}

fn to_builds(projects: &[CircleProject]) -> Vec<Build> {
    let mut builds = Vec::new();
    for project in projects {
        for (branch_name, branch) in &project.branches {
            match branch.latest() {
                Some((build, status)) => {
                    builds.push(build.to_build(&project.reponame, branch_name, status))
                }
                None => tracing::warn!(
                    repository = %project.reponame,
                    branch = %branch_name,
                    "branch has never been built, skipping"
                ),
            }
        }
    }
    builds
}

pub async fn fetch(
    transport: &dyn Transport,
    server_url: &str,
    token: Option<&str>,
) -> Result<Vec<Build>> {
    let token = token.unwrap_or_default();
    let url = format!("{server_url}?circle-token={token}");
    let headers = vec![header("Accept", "application/json")];
    let projects = transport::request::<Vec<CircleProject>>(transport, &url, &headers).await?;
    let builds = to_builds(&projects);
    tracing::debug!(projects = projects.len(), builds = builds.len(), "circle builds");
    Ok(builds)
}

#[cfg(test)]
mod circle_tests {
    use super::*;
    use crate::transport::fake::FakeTransport;
    use serde_json::json;

    fn time(s: &str) -> Option<DateTime<Utc>> {
        Some(s.parse().unwrap())
    }

    fn decode(value: serde_json::Value) -> Vec<Build> {
        let projects = serde_json::from_value::<Vec<CircleProject>>(value).unwrap();
        to_builds(&projects)
    }

    #[test]
    fn picks_highest_build_num_when_idle() {
        let builds = decode(json!([{
            "reponame": "tea-cup",
            "branches": {
                "master": {
                    "running_builds": [],
                    "recent_builds": [
                        {"build_num": 2, "outcome": "success", "pushed_at": "2024-03-02T10:00:00Z", "vcs_revision": "bbb"},
                        {"build_num": 1, "outcome": "failed", "pushed_at": "2024-03-01T10:00:00Z", "vcs_revision": "aaa"}
                    ]
                }
            }
        }]));
        let expected = vec![Build {
            repository: String::from("tea-cup"),
            branch: String::from("master"),
            started: time("2024-03-02T10:00:00Z"),
            state: BuildState::Success,
            commit: Commit {
                created: time("2024-03-02T10:00:00Z"),
                author: None,
                hash: Some(String::from("bbb")),
            },
        }];
        assert_eq!(builds, expected);
    }

    #[test]
    fn order_of_recent_builds_does_not_matter() {
        let builds = decode(json!([{
            "reponame": "r",
            "branches": {
                "dev": {
                    "recent_builds": [
                        {"build_num": 7, "outcome": "failed", "pushed_at": "2024-03-01T10:00:00Z"},
                        {"build_num": 9, "outcome": "canceled", "pushed_at": "2024-03-03T10:00:00Z"},
                        {"build_num": 8, "outcome": "success", "pushed_at": "2024-03-02T10:00:00Z"}
                    ]
                }
            }
        }]));
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].state, BuildState::Canceled);
        assert_eq!(builds[0].started, time("2024-03-03T10:00:00Z"));
    }

    #[test]
    fn running_build_wins_with_live_status() {
        let builds = decode(json!([{
            "reponame": "r",
            "branches": {
                "main": {
                    "running_builds": [
                        {"build_num": 5, "status": "running", "pushed_at": "2024-03-05T10:00:00Z", "vcs_revision": "run"}
                    ],
                    "recent_builds": [
                        {"build_num": 4, "outcome": "success", "pushed_at": "2024-03-04T10:00:00Z"}
                    ]
                }
            }
        }]));
        assert_eq!(builds[0].state, BuildState::Started);
        assert_eq!(builds[0].commit.hash.as_deref(), Some("run"));
    }

    #[test]
    fn never_built_branches_are_skipped() {
        let builds = decode(json!([{
            "reponame": "r",
            "branches": {
                "empty": {"running_builds": [], "recent_builds": []},
                "null": {"running_builds": null, "recent_builds": null},
                "missing": {},
                "built": {"recent_builds": [{"build_num": 1, "outcome": "failed"}]}
            }
        }]));
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].branch, "built");
        assert_eq!(builds[0].state, BuildState::Failed);
        assert_eq!(builds[0].started, None);
    }

    #[test]
    fn flattens_all_projects() {
        let builds = decode(json!([
            {"reponame": "a", "branches": {"x": {"recent_builds": [{"build_num": 1, "outcome": "success"}]}}},
            {"reponame": "b"},
            {"reponame": "c", "branches": {"y": {"recent_builds": [{"build_num": 1, "outcome": "success"}]}}}
        ]));
        let names: Vec<_> = builds.iter().map(|b| b.repository.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn token_goes_in_query_string() {
        let url = "https://circleci.com/api/v1/projects?circle-token=secret";
        let transport = FakeTransport::new().with_json(url, json!([]));
        let builds = fetch(&transport, "https://circleci.com/api/v1/projects", Some("secret"))
            .await
            .unwrap();
        assert!(builds.is_empty());
        assert_eq!(
            transport.headers_for(url).unwrap(),
            vec![header("Accept", "application/json")]
        );
    }
}
