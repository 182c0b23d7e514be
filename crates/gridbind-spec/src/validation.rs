use std::fmt;

/// One granular configuration problem, keyed by the offending config path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub path: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Aggregate of every issue found while validating a [`crate::BindConfig`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("configuration failed validation with {} issue(s)", issues.len())]
pub struct ValidationError {
    issues: Vec<ConfigIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ConfigIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[ConfigIssue] {
        &self.issues
    }
}
