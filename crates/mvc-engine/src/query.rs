//! The raw diagnostic query primitive.
//!
//! Queries are a closed set of statements over the three relations, each
//! with its bound parameters. Results come back as named columns and rows of
//! JSON values so they can cross an RPC boundary unchanged.

use mvc_codec::DocumentCodec;
use mvc_types::{AtomVersion, BranchKey, ChangeSetId, IndexChecksum, WorkspaceId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::commit::Tables;
use crate::error::EngineResult;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "statement", rename_all = "snake_case")]
pub enum DiagnosticQuery {
    /// `select count(*) from atoms [where kind = ?]`
    CountAtoms { kind: Option<String> },
    /// `select kind, args, checksum, size from atoms [where kind = ? [and args = ?]]`
    Atoms {
        kind: Option<String>,
        args: Option<String>,
    },
    /// One atom with its decoded document.
    Atom {
        kind: String,
        args: String,
        checksum: String,
    },
    /// `select count(*) from index_membership [where index_checksum = ?]`
    CountMembership { index_checksum: Option<IndexChecksum> },
    /// `select kind, args, checksum from index_membership where index_checksum = ?`
    Membership { index_checksum: IndexChecksum },
    /// Materialized snapshots with their row counts.
    Snapshots,
    /// `select * from branches [where workspace_id = ?]`
    Branches { workspace_id: Option<WorkspaceId> },
    /// The snapshot one branch resolves to.
    ResolveBranch {
        workspace_id: WorkspaceId,
        change_set_id: ChangeSetId,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryRows {
    fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn scalar(column: &str, value: Value) -> Self {
        let mut rows = Self::new(&[column]);
        rows.rows.push(vec![value]);
        rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first column of the first row.
    pub fn first(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.first())
    }

    /// The first cell as a count, for `count_*` statements.
    pub fn count(&self) -> Option<u64> {
        self.first().and_then(Value::as_u64)
    }

    /// The values of one named column.
    pub fn column(&self, name: &str) -> Vec<&Value> {
        match self.columns.iter().position(|c| c == name) {
            Some(i) => self.rows.iter().filter_map(|row| row.get(i)).collect(),
            None => Vec::new(),
        }
    }
}

pub(crate) fn execute(
    query: &DiagnosticQuery,
    tables: Tables<'_>,
    codec: &dyn DocumentCodec,
) -> EngineResult<QueryRows> {
    let rows = match query {
        DiagnosticQuery::CountAtoms { kind } => {
            let count = match kind {
                Some(kind) => tables
                    .atoms
                    .versions()?
                    .iter()
                    .filter(|v| v.kind() == kind)
                    .count(),
                None => tables.atoms.len()?,
            };
            QueryRows::scalar("count", json!(count))
        }
        DiagnosticQuery::Atoms { kind, args } => {
            let mut out = QueryRows::new(&["kind", "args", "checksum", "size"]);
            for atom in tables.atoms.scan()? {
                if kind.as_deref().map_or(false, |k| atom.version.kind() != k)
                    || args.as_deref().map_or(false, |a| atom.version.args() != a)
                {
                    continue;
                }
                out.rows.push(vec![
                    json!(atom.version.kind()),
                    json!(atom.version.args()),
                    json!(atom.version.checksum),
                    json!(atom.size()),
                ]);
            }
            out
        }
        DiagnosticQuery::Atom {
            kind,
            args,
            checksum,
        } => {
            let mut out = QueryRows::new(&["kind", "args", "checksum", "data"]);
            let version = AtomVersion::new(kind.clone(), args.clone(), checksum.as_str());
            if let Some(data) = tables.atoms.get(&version)? {
                out.rows.push(vec![
                    json!(kind),
                    json!(args),
                    json!(checksum),
                    codec.decode(&data)?,
                ]);
            }
            out
        }
        DiagnosticQuery::CountMembership { index_checksum } => QueryRows::scalar(
            "count",
            json!(tables.index.row_count(index_checksum.as_ref())?),
        ),
        DiagnosticQuery::Membership { index_checksum } => {
            let mut out = QueryRows::new(&["kind", "args", "checksum"]);
            for (key, checksum) in tables.index.membership(index_checksum)? {
                out.rows
                    .push(vec![json!(key.kind), json!(key.args), json!(checksum)]);
            }
            out
        }
        DiagnosticQuery::Snapshots => {
            let mut out = QueryRows::new(&["index_checksum", "rows", "branches"]);
            for index in tables.index.snapshots()? {
                let rows = tables.index.row_count(Some(&index))?;
                let pointing = tables.branches.pointing_at(&index)?.len();
                out.rows.push(vec![json!(index), json!(rows), json!(pointing)]);
            }
            out
        }
        DiagnosticQuery::Branches { workspace_id } => {
            let mut out = QueryRows::new(&["workspace_id", "change_set_id", "index_checksum"]);
            for pointer in tables.branches.list(workspace_id.as_ref())? {
                out.rows.push(vec![
                    json!(pointer.branch.workspace_id),
                    json!(pointer.branch.change_set_id),
                    json!(pointer.index_checksum),
                ]);
            }
            out
        }
        DiagnosticQuery::ResolveBranch {
            workspace_id,
            change_set_id,
        } => {
            let branch = BranchKey::new(workspace_id.clone(), change_set_id.clone());
            let mut out = QueryRows::new(&["index_checksum"]);
            if let Some(index) = tables.branches.resolve(&branch)? {
                out.rows.push(vec![json!(index)]);
            }
            out
        }
    };
    Ok(rows)
}
