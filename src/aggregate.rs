use itertools::Itertools;
use regex::Regex;

use crate::{build::Build, error::Result};

/// Repository allow-list and branch pattern. An empty setting means no filter.
#[derive(Debug, Default)]
pub struct Filters {
    repositories: Option<Vec<String>>,
    branch: Option<Regex>,
}

impl Filters {
    pub fn new(repositories: Option<&str>, branch: Option<&str>) -> Result<Self> {
        let repositories = repositories
            .filter(|s| !s.is_empty())
            .map(|s| s.split(',').map(String::from).collect());
        let branch = branch.filter(|s| !s.is_empty()).map(Regex::new).transpose()?;
        Ok(Self {
            repositories,
            branch,
        })
    }

    fn keeps_repository(&self, build: &Build) -> bool {
        match &self.repositories {
            Some(allowed) => allowed.iter().any(|r| *r == build.repository),
            None => true,
        }
    }

    fn keeps_branch(&self, build: &Build) -> bool {
        match &self.branch {
            Some(pattern) => pattern.is_match(&build.branch),
            None => true,
        }
    }
}

/// Filters, keeps the first build seen for each (repository, branch) and
/// orders the survivors by start time. Unknown start times sort first.
pub fn aggregate(builds: Vec<Build>, filters: &Filters) -> Vec<Build> {
    let mut builds: Vec<Build> = builds
        .into_iter()
        .filter(|b| filters.keeps_repository(b))
        .filter(|b| filters.keeps_branch(b))
        .unique_by(|b| (b.repository.clone(), b.branch.clone()))
        .collect();
    builds.sort_by_key(|b| b.started);
    builds
}
