use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};

use crate::{
    build::{Build, BuildState, Commit},
    error::Result,
    transport::{self, Headers, Transport, header},
};

// Jenkins has no flat list of builds, so one deep projection walks
// folder -> project -> job -> build.
const TREE: &str = "name,url,jobs[name,url,jobs[name,url,actions[contributor,contributorDisplayName,contributorEmail],buildable,builds[result,building,actions[causes[shortDescription]],changeSets[items[author[fullName],timestamp,commitId]],timestamp]]]";

const CAUSE_ACTION_CLASS: &str = "hudson.model.CauseAction";

#[derive(Debug, serde::Deserialize, PartialEq)]
struct JenkinsResponse {
    #[serde(default)]
    jobs: Vec<JenkinsProject>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct JenkinsProject {
    name: String,
    #[serde(default)]
    jobs: Vec<JenkinsJob>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct JenkinsJob {
    name: String,
    buildable: Option<bool>,
    #[serde(default)]
    builds: Vec<JenkinsBuild>,
    #[serde(default)]
    actions: Vec<JobAction>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct JobAction {
    contributor: Option<String>,
    contributor_display_name: Option<String>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct JenkinsBuild {
    result: Option<String>,
    #[serde(default)]
    building: bool,
    #[serde(default)]
    actions: Vec<BuildAction>,
    #[serde(default)]
    change_sets: Vec<ChangeSet>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct BuildAction {
    #[serde(rename = "_class")]
    class: Option<String>,
    #[serde(default)]
    causes: Vec<Cause>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Cause {
    short_description: Option<String>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct ChangeSet {
    #[serde(default)]
    items: Vec<ChangeSetItem>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ChangeSetItem {
    author: Option<Author>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    timestamp: Option<DateTime<Utc>>,
    commit_id: Option<String>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Author {
    full_name: Option<String>,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

fn last_change_set_commit(job: &JenkinsJob) -> Option<Commit> {
    let build = job.builds.iter().find(|b| !b.change_sets.is_empty())?;
    let item = build.change_sets.first()?.items.last()?;
    Some(Commit {
        created: item.timestamp,
        author: item.author.as_ref().and_then(|a| a.full_name.clone()),
        hash: item.commit_id.clone(),
    })
}

fn responsible_contributor(job: &JenkinsJob) -> Option<Commit> {
    let author = job.actions.iter().find_map(|action| {
        non_empty(&action.contributor_display_name).or(non_empty(&action.contributor))
    })?;
    Some(Commit {
        created: job.timestamp,
        author: Some(author.to_string()),
        hash: None,
    })
}

fn build_causes(job: &JenkinsJob) -> Option<Commit> {
    let build = job.builds.iter().find(|b| !b.actions.is_empty())?;
    let reason = build
        .actions
        .iter()
        .filter(|a| a.class.as_deref() == Some(CAUSE_ACTION_CLASS))
        .flat_map(|a| a.causes.iter())
        .filter_map(|c| c.short_description.as_deref())
        .collect::<Vec<_>>()
        .join(";");
    Some(Commit {
        created: None,
        author: Some(reason),
        hash: None,
    })
}

type CommitResolver = fn(&JenkinsJob) -> Option<Commit>;

/// Tried in order, the first one that finds anything wins.
const COMMIT_RESOLVERS: [CommitResolver; 3] =
    [last_change_set_commit, responsible_contributor, build_causes];

fn resolve_commit(job: &JenkinsJob) -> Commit {
    COMMIT_RESOLVERS
        .iter()
        .find_map(|resolve| resolve(job))
        .unwrap_or_default()
}

fn job_state(build: Option<&JenkinsBuild>) -> BuildState {
    match build {
        Some(b) if b.building => BuildState::Started,
        Some(b) => match b.result.as_deref() {
            Some("ABORTED") => BuildState::Canceled,
            Some("SUCCESS") => BuildState::Success,
            _ => BuildState::Failed,
        },
        None => BuildState::Failed,
    }
}

impl JenkinsResponse {
    fn to_builds(&self) -> Vec<Build> {
        self.jobs
            .iter()
            .flat_map(|project| {
                project
                    .jobs
                    .iter()
                    .filter(|job| job.buildable.unwrap_or(false))
                    .map(move |job| {
                        let latest = job.builds.first();
                        Build {
                            repository: project.name.clone(),
                            branch: job.name.clone(),
                            started: latest.and_then(|b| b.timestamp),
                            state: job_state(latest),
                            commit: resolve_commit(job),
                        }
                    })
            })
            .collect()
    }
}

fn jenkins_headers(token: Option<&str>) -> Headers {
    let mut headers = Vec::new();
    if let Some(t) = token {
        headers.push(header("Authorization", format!("Basic {}", STANDARD.encode(t))));
    }
    headers
}

pub async fn fetch(
    transport: &dyn Transport,
    server_url: &str,
    token: Option<&str>,
) -> Result<Vec<Build>> {
    let url = format!("{server_url}/api/json?depth=4&tree={TREE}");
    let headers = jenkins_headers(token);
    let response = transport::request::<JenkinsResponse>(transport, &url, &headers).await?;
    let builds = response.to_builds();
    tracing::debug!(projects = response.jobs.len(), builds = builds.len(), "jenkins builds");
    Ok(builds)
}
