//! Workspace and change set id validation.
//!
//! Ids are opaque strings minted upstream, so the rules are deliberately
//! loose:
//! - Must be non-empty
//! - Must not contain whitespace or control characters
//! - Must not be the sentinel `"0"`, which means "absent" on the wire

use mvc_types::{BranchKey, SENTINEL};

use crate::error::{RefError, Result};

/// Validate one id. `what` names the id in the error ("workspace",
/// "change set").
///
/// # Examples
///
/// ```
/// use mvc_refs::names::validate_id;
///
/// assert!(validate_id("workspace", "01HX3W8Z").is_ok());
/// assert!(validate_id("workspace", "").is_err());
/// assert!(validate_id("change set", "has space").is_err());
/// ```
pub fn validate_id(what: &'static str, id: &str) -> Result<()> {
    let invalid = |reason: String| RefError::InvalidId {
        what,
        id: id.to_string(),
        reason,
    };

    if id.is_empty() {
        return Err(invalid("must not be empty".into()));
    }
    if id == SENTINEL {
        return Err(invalid("the sentinel \"0\" is reserved".into()));
    }
    if let Some(ch) = id.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }
    Ok(())
}

/// Validate both halves of a branch key.
pub fn validate_branch_key(branch: &BranchKey) -> Result<()> {
    validate_id("workspace", branch.workspace_id.as_str())?;
    validate_id("change set", branch.change_set_id.as_str())
}
