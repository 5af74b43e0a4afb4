//! Entity kinds and the remote commands each one uses.

use library::Collection;
use std::fmt;

/// Kind of configuration entity managed on a Jenkins instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Job,
    View,
    Node,
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Job, Kind::View, Kind::Node];

    pub fn name(self) -> &'static str {
        match self {
            Kind::Job => "job",
            Kind::View => "view",
            Kind::Node => "node",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn get_command(self) -> &'static str {
        match self {
            Kind::Job => "get-job",
            Kind::View => "get-view",
            Kind::Node => "get-node",
        }
    }

    pub fn update_command(self) -> &'static str {
        match self {
            Kind::Job => "update-job",
            Kind::View => "update-view",
            Kind::Node => "update-node",
        }
    }

    pub fn create_command(self) -> &'static str {
        match self {
            Kind::Job => "create-job",
            Kind::View => "create-view",
            Kind::Node => "create-node",
        }
    }

    pub fn delete_command(self) -> &'static str {
        match self {
            Kind::Job => "delete-job",
            Kind::View => "delete-view",
            Kind::Node => "delete-node",
        }
    }

    /// Path segment preceding the entity name in instance URLs.
    pub fn url_segment(self) -> &'static str {
        match self {
            Kind::Job => "job",
            Kind::View => "view",
            Kind::Node => "computer",
        }
    }

    /// Regex fragment matching the kind's path segment.
    ///
    /// Nodes are served under `computer/` but `node/` is accepted too.
    pub(crate) fn grammar(self) -> &'static str {
        match self {
            Kind::Job => "job",
            Kind::View => "view",
            Kind::Node => "(?:computer|node)",
        }
    }

    /// Local mirror collection holding this kind's blobs.
    pub fn collection(self) -> Collection {
        match self {
            Kind::Job => Collection::Jobs,
            Kind::View => Collection::Views,
            Kind::Node => Collection::Nodes,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
