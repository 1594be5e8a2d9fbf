//! Reverse index from neighbour repository to the stargazers it shares with
//! a target repository, and its ranking.

use crate::models::{NeighbourResult, RepositoryFullName, StarredRepoSet};
use std::collections::{BTreeSet, HashMap};

/// Neighbour repository → stargazers connecting it to the target.
///
/// The target itself is never a key, whatever its casing.
#[derive(Debug, Clone)]
pub struct NeighbourIndex {
    target: RepositoryFullName,
    entries: HashMap<RepositoryFullName, BTreeSet<String>>,
}

impl NeighbourIndex {
    pub fn new(target: RepositoryFullName) -> Self {
        NeighbourIndex {
            target,
            entries: HashMap::new(),
        }
    }

    pub fn target(&self) -> &RepositoryFullName {
        &self.target
    }

    /// Record that `stargazer` starred `repo`. Returns false when `repo` is
    /// the target or the pair was already present.
    pub fn record(&mut self, stargazer: &str, repo: &RepositoryFullName) -> bool {
        if *repo == self.target {
            return false;
        }
        self.entries
            .entry(repo.clone())
            .or_default()
            .insert(stargazer.to_string())
    }

    pub fn record_all(&mut self, starred: &StarredRepoSet) {
        for (stargazer, repos) in starred.iter() {
            for repo in repos {
                self.record(stargazer, repo);
            }
        }
    }

    /// Fold another partial index for the same target into this one.
    pub fn merge(&mut self, other: NeighbourIndex) {
        for (repo, stargazers) in other.entries {
            if repo == self.target {
                continue;
            }
            self.entries.entry(repo).or_default().extend(stargazers);
        }
    }

    pub fn stargazers_of(&self, repo: &RepositoryFullName) -> Option<&BTreeSet<String>> {
        self.entries.get(repo)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Results ordered by shared-stargazer count, most first. Equal counts
    /// are ordered by repository name, ignoring case.
    pub fn into_ranked(self) -> Vec<NeighbourResult> {
        let mut ranked: Vec<(RepositoryFullName, BTreeSet<String>)> = self.entries.into_iter().collect();
        ranked.sort_by(|(repo_a, gazers_a), (repo_b, gazers_b)| {
            gazers_b.len().cmp(&gazers_a.len()).then_with(|| repo_a.cmp(repo_b))
        });

        ranked
            .into_iter()
            .map(|(repo, stargazers)| NeighbourResult {
                repo: repo.full_name(),
                stargazers: stargazers.into_iter().collect(),
            })
            .collect()
    }
}

/// Rank the repositories that share stargazers with `target`.
pub fn find_neighbours(starred: &StarredRepoSet, target: &RepositoryFullName) -> Vec<NeighbourResult> {
    let mut index = NeighbourIndex::new(target.clone());
    index.record_all(starred);
    index.into_ranked()
}
