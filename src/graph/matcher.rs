//! Label matching predicate.

/// Query label that matches every node.
pub const WILDCARD_LABEL: &str = "*";

/// Decides whether a node's labels answer a query label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMatcher {
    case_sensitive: bool,
}

impl Default for LabelMatcher {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LabelMatcher {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    /// Match a single label: equality in exact mode, substring in inclusive mode.
    pub fn matches_label(&self, label: &str, query: &str, inclusive: bool) -> bool {
        if query == WILDCARD_LABEL {
            return true;
        }
        if self.case_sensitive {
            if inclusive {
                label.contains(query)
            } else {
                label == query
            }
        } else {
            let label = label.to_lowercase();
            let query = query.to_lowercase();
            if inclusive {
                label.contains(&query)
            } else {
                label == query
            }
        }
    }

    /// True iff any of `labels` matches `query`.
    pub fn matches<'a, I>(&self, labels: I, query: &str, inclusive: bool) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        labels
            .into_iter()
            .any(|label| self.matches_label(label, query, inclusive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn labels(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_membership() {
        let m = LabelMatcher::default();
        assert!(m.matches(&labels(&["Person", "Author"]), "Author", false));
        assert!(!m.matches(&labels(&["Person", "Author"]), "Auth", false));
    }

    #[test]
    fn test_inclusive_substring() {
        let m = LabelMatcher::default();
        assert!(m.matches(&labels(&["Person", "Author"]), "Auth", true));
        assert!(!m.matches(&labels(&["Person"]), "Org", true));
    }

    #[test]
    fn test_case_sensitivity() {
        let sensitive = LabelMatcher::new(true);
        let insensitive = LabelMatcher::new(false);
        assert!(!sensitive.matches(&labels(&["Person"]), "person", false));
        assert!(insensitive.matches(&labels(&["Person"]), "person", false));
        assert!(insensitive.matches(&labels(&["PERSONAL"]), "son", true));
    }

    #[test]
    fn test_wildcard_matches_everything() {
        let m = LabelMatcher::default();
        assert!(m.matches(&labels(&["anything"]), "*", false));
        assert!(m.matches(&labels(&["anything"]), "*", true));
    }

    #[test]
    fn test_empty_label_set_never_matches() {
        let m = LabelMatcher::default();
        assert!(!m.matches(&BTreeSet::new(), "X", true));
    }
}
