//! Destination resolution for route registration.
//!
//! A server declares a fixed set of API versions at initialization; named
//! groups are declared afterwards, each materializing as a group-only subtree
//! plus one composite subtree per version (keyed `"{version}.{group}"`). A
//! route then names zero or more versions and zero or more groups, and the
//! registrar resolves that cross product to the concrete set of subtrees the
//! handler is mounted on.
//!
//! Resolution rules, applied per route:
//!
//! - with groups, per group `g`:
//!   - versions present: tokens are scanned in order; `"all"` fans out to
//!     every declared version's `(version, g)` subtree and stops the scan;
//!     `""` targets the group-only subtree and stops the scan; any other
//!     token targets `(token, g)` if such a subtree exists and is silently
//!     skipped otherwise.
//!   - no versions: the group-only subtree, if declared.
//! - without groups: the same token scan against version subtrees; `""`
//!   targets the server root. With neither versions nor groups the route goes
//!   to the root.
//!
//! Unknown version or group keys never error; they drop the attachment.
//! The returned destination list is deduplicated, so a route lands on any
//! subtree at most once no matter how redundant its token lists are.

use std::collections::BTreeSet;

/// Reserved version token: fan out to every declared version.
pub const VERSION_ALL: &str = "all";

/// A concrete mount point resolved for a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    /// The server's root router.
    Root,
    /// A version subtree, e.g. `/v1`.
    Version(String),
    /// A named-group subtree by composite key, e.g. `admin` or `v1.admin`.
    Group(String),
}

impl Destination {
    /// Path prefix this destination mounts at (`""` for the root).
    pub fn prefix(&self) -> String {
        match self {
            Self::Root => String::new(),
            Self::Version(v) => format!("/{v}"),
            Self::Group(key) => format!("/{}", key.replace('.', "/")),
        }
    }
}

/// Tracks declared versions and group keys and resolves route destinations.
#[derive(Debug, Clone, Default)]
pub struct Registrar {
    versions: Vec<String>,
    group_keys: BTreeSet<String>,
}

impl Registrar {
    pub fn new(versions: Vec<String>) -> Self {
        Self {
            versions,
            group_keys: BTreeSet::new(),
        }
    }

    /// Declared version tags, in declaration order.
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// Declare a named group. Registers the group-only key plus one
    /// composite key per declared version, and returns all keys created.
    pub fn declare_group(&mut self, name: &str) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.versions.len() + 1);
        for version in &self.versions {
            keys.push(format!("{version}.{name}"));
        }
        keys.push(name.to_string());
        for key in &keys {
            self.group_keys.insert(key.clone());
        }
        keys
    }

    pub fn has_group(&self, key: &str) -> bool {
        self.group_keys.contains(key)
    }

    /// Resolve the destination set for a route's version and group lists.
    pub fn resolve(&self, versions: &[String], groups: &[String]) -> Vec<Destination> {
        let mut out: Vec<Destination> = Vec::new();
        let mut push = |dest: Destination, out: &mut Vec<Destination>| {
            if !out.contains(&dest) {
                out.push(dest);
            }
        };

        if !groups.is_empty() {
            for group in groups {
                if !versions.is_empty() {
                    for version in versions {
                        if version == VERSION_ALL {
                            for declared in &self.versions {
                                let key = format!("{declared}.{group}");
                                if self.group_keys.contains(&key) {
                                    push(Destination::Group(key), &mut out);
                                }
                            }
                            break;
                        } else if version.is_empty() {
                            if self.group_keys.contains(group.as_str()) {
                                push(Destination::Group(group.clone()), &mut out);
                            }
                            break;
                        } else {
                            let key = format!("{version}.{group}");
                            if self.group_keys.contains(&key) {
                                push(Destination::Group(key), &mut out);
                            } else {
                                tracing::debug!(%version, %group, "no subtree for version/group, skipping");
                            }
                        }
                    }
                } else if self.group_keys.contains(group.as_str()) {
                    push(Destination::Group(group.clone()), &mut out);
                }
            }
        } else if !versions.is_empty() {
            for version in versions {
                if version == VERSION_ALL {
                    for declared in &self.versions {
                        push(Destination::Version(declared.clone()), &mut out);
                    }
                    break;
                } else if version.is_empty() {
                    push(Destination::Root, &mut out);
                    break;
                } else if self.versions.iter().any(|v| v == version) {
                    push(Destination::Version(version.clone()), &mut out);
                } else {
                    tracing::debug!(%version, "unknown version, skipping");
                }
            }
        } else {
            push(Destination::Root, &mut out);
        }

        out
    }
}
