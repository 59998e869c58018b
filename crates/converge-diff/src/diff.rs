//! Structural diff between two configuration payloads

use converge_fs::canonicalize;
use serde_json::Value;
use similar::TextDiff;
use std::fmt;

/// Maximum recursion depth for diff operations
const MAX_DIFF_DEPTH: usize = 128;

/// A single difference at a field path.
///
/// `old` is the remote side, `new` is the local side.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    /// Field only present locally
    Added { path: String, value: Value },
    /// Field only present remotely
    Removed { path: String, value: Value },
    /// Field present on both sides with different values
    Modified { path: String, old: Value, new: Value },
}

impl FieldChange {
    pub fn path(&self) -> &str {
        match self {
            Self::Added { path, .. } | Self::Removed { path, .. } | Self::Modified { path, .. } => {
                path
            }
        }
    }

    /// Remote value, `None` when the field was added locally.
    pub fn old_value(&self) -> Option<&Value> {
        match self {
            Self::Added { .. } => None,
            Self::Removed { value, .. } => Some(value),
            Self::Modified { old, .. } => Some(old),
        }
    }

    /// Local value, `None` when the field was removed locally.
    pub fn new_value(&self) -> Option<&Value> {
        match self {
            Self::Added { value, .. } => Some(value),
            Self::Removed { .. } => None,
            Self::Modified { new, .. } => Some(new),
        }
    }
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { path, value } => write!(f, "+ {}: {}", path, value),
            Self::Removed { path, value } => write!(f, "- {}: {}", path, value),
            Self::Modified { path, old, new } => write!(f, "~ {}: {} -> {}", path, old, new),
        }
    }
}

/// Result of comparing a remote configuration with a local one.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDiff {
    /// Changes in traversal order (remote keys first, then local additions)
    pub changes: Vec<FieldChange>,
    old_text: String,
    new_text: String,
}

impl ConfigDiff {
    /// Compute the diff from `old` (remote) to `new` (local).
    ///
    /// Paths use dotted keys and bracketed indices, e.g. `tunnel.hosts[0]`.
    pub fn compute(old: &Value, new: &Value) -> Self {
        let old = canonicalize(old);
        let new = canonicalize(new);

        let mut changes = Vec::new();
        diff_values(&old, &new, String::new(), &mut changes, 0);

        Self {
            changes,
            old_text: render_yaml(&old),
            new_text: render_yaml(&new),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Unified diff of both sides rendered as canonical YAML.
    ///
    /// Returns an empty string when there is no change.
    pub fn render(&self) -> String {
        if self.changes.is_empty() {
            return String::new();
        }

        let text_diff = TextDiff::from_lines(&self.old_text, &self.new_text);
        text_diff
            .unified_diff()
            .context_radius(3)
            .header("remote", "local")
            .to_string()
    }

    /// One line per change, suitable for log output.
    pub fn summary(&self) -> String {
        self.changes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_yaml(value: &Value) -> String {
    serde_yaml::to_string(value)
        .or_else(|_| serde_json::to_string_pretty(value).map(|s| s + "\n"))
        .unwrap_or_default()
}

fn child_key_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn diff_values(old: &Value, new: &Value, path: String, changes: &mut Vec<FieldChange>, depth: usize) {
    // Past the depth limit a subtree is compared as a single value
    if depth > MAX_DIFF_DEPTH {
        if old != new {
            changes.push(FieldChange::Modified {
                path,
                old: old.clone(),
                new: new.clone(),
            });
        }
        return;
    }

    match (old, new) {
        (Value::Object(old_obj), Value::Object(new_obj)) => {
            for (key, old_value) in old_obj {
                let child_path = child_key_path(&path, key);
                match new_obj.get(key) {
                    Some(new_value) => {
                        diff_values(old_value, new_value, child_path, changes, depth + 1)
                    }
                    None => changes.push(FieldChange::Removed {
                        path: child_path,
                        value: old_value.clone(),
                    }),
                }
            }

            for (key, new_value) in new_obj {
                if !old_obj.contains_key(key) {
                    changes.push(FieldChange::Added {
                        path: child_key_path(&path, key),
                        value: new_value.clone(),
                    });
                }
            }
        }

        (Value::Array(old_arr), Value::Array(new_arr)) => {
            let max_len = old_arr.len().max(new_arr.len());
            for i in 0..max_len {
                let child_path = format!("{}[{}]", path, i);
                match (old_arr.get(i), new_arr.get(i)) {
                    (Some(old_val), Some(new_val)) => {
                        diff_values(old_val, new_val, child_path, changes, depth + 1)
                    }
                    (Some(old_val), None) => changes.push(FieldChange::Removed {
                        path: child_path,
                        value: old_val.clone(),
                    }),
                    (None, Some(new_val)) => changes.push(FieldChange::Added {
                        path: child_path,
                        value: new_val.clone(),
                    }),
                    (None, None) => unreachable!(),
                }
            }
        }

        _ => {
            if old != new {
                changes.push(FieldChange::Modified {
                    path,
                    old: old.clone(),
                    new: new.clone(),
                });
            }
        }
    }
}
