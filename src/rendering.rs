use chrono::{DateTime, Utc};

use crate::build::{Build, BuildState};

struct RowData {
    state: char,
    title: String,
    started: String,
    age: String,
    commit: String,
}

fn state_to_char(state: BuildState) -> char {
    match state {
        BuildState::Success => '✅',
        BuildState::Failed => '❌',
        BuildState::Started => '⏳',
        BuildState::Canceled => '⛔',
        BuildState::Unknown => '❔',
    }
}

fn pad_str(s: &str, i: usize) -> String {
    format!("{:width$}", s, width = i)
}

fn age(started: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match (now - started).to_std() {
        Ok(elapsed) => {
            let rounded = std::time::Duration::from_secs(elapsed.as_secs());
            format!("{} ago", pretty_duration::pretty_duration(&rounded, None))
        }
        Err(_) => String::new(),
    }
}

fn commit_summary(build: &Build) -> String {
    let hash: String = build
        .commit
        .hash
        .as_deref()
        .unwrap_or_default()
        .chars()
        .take(8)
        .collect();
    let author = build.commit.author.as_deref().unwrap_or_default();
    format!("{hash} {author}").trim().to_string()
}

fn to_rows(builds: &[Build], now: DateTime<Utc>) -> Vec<RowData> {
    builds
        .iter()
        .map(|build| RowData {
            state: state_to_char(build.state),
            title: format!("{}/{}", build.repository, build.branch),
            started: build
                .started
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            age: build.started.map(|t| age(t, now)).unwrap_or_default(),
            commit: commit_summary(build),
        })
        .collect()
}

/// Prints one line per build, in the order given.
pub fn render_rows(builds: &[Build]) {
    let rows = to_rows(builds, Utc::now());
    let max_title = rows.iter().map(|r| r.title.chars().count()).max().unwrap_or(0);
    let max_started = rows.iter().map(|r| r.started.len()).max().unwrap_or(0);
    let max_age = rows.iter().map(|r| r.age.chars().count()).max().unwrap_or(0);

    for row in rows {
        let state = row.state;
        let title = pad_str(&row.title, max_title);
        let started = pad_str(&row.started, max_started);
        let age = pad_str(&row.age, max_age);
        let commit = row.commit;
        println!("{state} {title} | {started} | {age} | {commit}");
    }
}

#[cfg(test)]
mod rendering_tests {
    use super::*;
    use crate::build::Commit;

    #[test]
    fn row_contents() {
        let started = DateTime::from_timestamp(1_700_000_000, 0);
        let build = Build {
            repository: String::from("api"),
            branch: String::from("main"),
            started,
            state: BuildState::Failed,
            commit: Commit {
                created: None,
                author: Some(String::from("Ada")),
                hash: Some(String::from("0123456789abcdef")),
            },
        };
        let rows = to_rows(&[build], started.unwrap() + chrono::Duration::hours(2));
        assert_eq!(rows[0].state, '❌');
        assert_eq!(rows[0].title, "api/main");
        assert_eq!(rows[0].started, "2023-11-14 22:13:20");
        assert!(rows[0].age.ends_with(" ago"));
        assert_eq!(rows[0].commit, "01234567 Ada");
    }

    #[test]
    fn missing_fields_render_empty() {
        let build = Build {
            repository: String::from("api"),
            branch: String::from("dev"),
            started: None,
            state: BuildState::Unknown,
            commit: Commit::default(),
        };
        let rows = to_rows(&[build], Utc::now());
        assert_eq!(rows[0].started, "");
        assert_eq!(rows[0].age, "");
        assert_eq!(rows[0].commit, "");
    }
}
