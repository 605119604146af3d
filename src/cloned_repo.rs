use std::path::PathBuf;

/// A shallow checkout owned by exactly one evaluation. It is created by the
/// clone manager and removed again by it once the scorers are done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedRepository {
    pub owner: String,
    pub repo: String,
    pub local_path: PathBuf,
}

impl ClonedRepository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}
