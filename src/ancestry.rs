use std::collections::BTreeSet;

use crate::render::RenderStep;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRow {
    pub commit_id: String,
    pub parent_ids: Vec<String>,
}

impl CommitRow {
    pub fn new(commit_id: impl Into<String>, parent_ids: Vec<String>) -> Self {
        Self {
            commit_id: commit_id.into(),
            parent_ids,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkPhase {
    SeedBackward,
    MarkForward,
    Done,
}

/// Marks which rows of a reverse-topological commit list (children before
/// parents, newest first) are connected by ancestry to a target commit.
///
/// One backward pass seeds the set with everything from the oldest row up to
/// the target, then one forward pass marks each remaining row whose parent is
/// already connected. Because the list is reverse-topological no fixpoint
/// iteration is needed. The set is monotonic; ids are never removed. Rows
/// left out of the set get the host's "indirect ancestor" treatment.
///
/// Runs as a `RenderStep` so large lists share the renderer's time slicing.
pub struct AncestryMarker {
    rows: Vec<CommitRow>,
    target: String,
    connected: BTreeSet<String>,
    phase: MarkPhase,
    cursor: usize,
}

impl AncestryMarker {
    pub fn new(rows: Vec<CommitRow>, target: impl Into<String>) -> Self {
        let cursor = rows.len();
        let phase = if rows.is_empty() {
            MarkPhase::Done
        } else {
            MarkPhase::SeedBackward
        };
        Self {
            rows,
            target: target.into(),
            connected: BTreeSet::new(),
            phase,
            cursor,
        }
    }

    pub fn is_connected(&self, commit_id: &str) -> bool {
        self.connected.contains(commit_id)
    }

    pub fn connected(&self) -> &BTreeSet<String> {
        &self.connected
    }

    pub fn into_connected(self) -> BTreeSet<String> {
        self.connected
    }

    pub fn rows(&self) -> &[CommitRow] {
        &self.rows
    }

    /// Convenience for callers that do not need time slicing.
    pub fn mark_all(mut self) -> BTreeSet<String> {
        while self.step() {}
        self.connected
    }
}

impl RenderStep for AncestryMarker {
    fn step(&mut self) -> bool {
        match self.phase {
            MarkPhase::SeedBackward => {
                self.cursor -= 1;
                let row = &self.rows[self.cursor];
                self.connected.insert(row.commit_id.clone());
                if row.commit_id == self.target || self.cursor == 0 {
                    self.phase = if self.cursor == 0 {
                        MarkPhase::Done
                    } else {
                        MarkPhase::MarkForward
                    };
                }
            }
            MarkPhase::MarkForward => {
                self.cursor -= 1;
                let row = &self.rows[self.cursor];
                if row
                    .parent_ids
                    .iter()
                    .any(|parent| self.connected.contains(parent))
                {
                    self.connected.insert(row.commit_id.clone());
                }
                if self.cursor == 0 {
                    self.phase = MarkPhase::Done;
                }
            }
            MarkPhase::Done => {}
        }
        self.phase != MarkPhase::Done
    }

    fn completed(&self) -> usize {
        self.rows.len() - self.cursor
    }

    fn total(&self) -> usize {
        self.rows.len()
    }
}
