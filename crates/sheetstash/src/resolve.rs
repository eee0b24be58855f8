// SPDX-FileCopyrightText: 2026 sheetstash contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Name resolution: deciding whether a caller-supplied token is a remote
//! id or a name to look up
//!
//! Tokens matching the remote identifier alphabet are used verbatim; the
//! store only falls back to a contains-match over stored names for tokens
//! that cannot be ids. Ties between matching names go to the most recently
//! modified document.

use crate::catalog::DocumentMeta;
use regex::Regex;
use std::sync::LazyLock;

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z0-9_-]+$").expect("valid pattern"));

/// Whether a token is syntactically a remote identifier.
///
/// Note that bare names without extensions (`report`) also match; callers
/// wanting a name lookup for such tokens must use the lookup API directly.
pub fn looks_like_id(token: &str) -> bool {
    ID_PATTERN.is_match(token)
}

/// Pick the winner among multiple name matches: most recently modified,
/// id as tie-break so the choice is deterministic.
pub fn pick_latest(candidates: Vec<DocumentMeta>) -> Option<DocumentMeta> {
    candidates
        .into_iter()
        .max_by(|a, b| (&a.modified, &a.id).cmp(&(&b.modified, &b.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeTag;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn meta(id: &str, secs: i64) -> DocumentMeta {
        DocumentMeta {
            id: id.to_string(),
            name: "n".to_string(),
            type_tag: TypeTag::Sheet,
            parent: None,
            properties: HashMap::new(),
            owners: vec![],
            modified: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_id_pattern() {
        assert!(looks_like_id("1x4GCHo0HVZ4jmJJYTdVFImVIF-Cm4Zml"));
        assert!(looks_like_id("report"));
        assert!(looks_like_id("doc_0000002a"));
        assert!(!looks_like_id("report.pdf"));
        assert!(!looks_like_id("my file"));
        assert!(!looks_like_id(""));
    }

    #[test]
    fn test_pick_latest() {
        assert!(pick_latest(vec![]).is_none());
        let picked = pick_latest(vec![meta("a", 10), meta("b", 30), meta("c", 20)]).unwrap();
        assert_eq!(picked.id, "b");

        // Equal timestamps: highest id wins, deterministically.
        let picked = pick_latest(vec![meta("a", 10), meta("b", 10)]).unwrap();
        assert_eq!(picked.id, "b");
    }
}
