//! Robots.txt parser implementation
//!
//! Supports the prefix-match subset: `User-agent`, `Allow` and `Disallow`.
//! Wildcards, `$` anchors, `Crawl-delay` and `Sitemap` lines are not
//! interpreted; unknown fields are skipped.

use std::collections::HashMap;
use url::Url;

/// A single allow/disallow prefix
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    /// Lowercased path prefix
    prefix: String,
    allow: bool,
}

/// All rules registered for one user agent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AgentRules {
    rules: Vec<Rule>,
}

impl AgentRules {
    /// Longest matching prefix wins; equal lengths resolve to allow.
    /// Returns None when no prefix matches.
    fn decide(&self, path: &str) -> Option<bool> {
        let mut best: Option<(usize, bool)> = None;

        for rule in &self.rules {
            if !path.starts_with(&rule.prefix) {
                continue;
            }
            let len = rule.prefix.len();
            best = match best {
                Some((best_len, best_allow))
                    if best_len > len || (best_len == len && (best_allow || !rule.allow)) =>
                {
                    Some((best_len, best_allow))
                }
                _ => Some((len, rule.allow)),
            };
        }

        best.map(|(_, allow)| allow)
    }
}

/// Percent-encodes a rule value the same way request URLs are encoded
///
/// Request paths arrive percent-encoded (`/caf%C3%A9`), so a rule written
/// as `/café` must be encoded before prefix comparison. Already-encoded
/// sequences are left alone. Values not starting with `/` are kept as is.
fn encode_rule_path(value: &str) -> String {
    if !value.starts_with('/') {
        return value.to_string();
    }
    let Ok(mut url) = Url::parse("http://robots.invalid/") else {
        return value.to_string();
    };
    match value.split_once('?') {
        Some((path, query)) => {
            url.set_path(path);
            url.set_query(Some(query));
        }
        None => url.set_path(value),
    }
    crate::url::robots_path(&url)
}

/// Parsed robots.txt data
///
/// Rule groups are keyed by lowercased agent string. The table is built once
/// and read-only afterwards, so it can be shared freely between fetch workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRobots {
    /// Agent -> rules
    groups: HashMap<String, AgentRules>,
}

impl ParsedRobots {
    /// Parses raw robots.txt content
    ///
    /// Consecutive `User-agent` lines share one group. A `User-agent` line
    /// that follows an `Allow`/`Disallow` line starts a new group. Rule lines
    /// before any `User-agent` line belong to nobody and are dropped.
    pub fn from_content(content: &str) -> Self {
        let mut groups: HashMap<String, AgentRules> = HashMap::new();
        let mut current_agents: Vec<String> = Vec::new();
        let mut last_was_rule = false;

        for line in content.split(['\r', '\n']) {
            let clean = line.split('#').next().unwrap_or_default().trim();
            if clean.is_empty() {
                continue;
            }

            let Some((field, value)) = clean.split_once(':') else {
                continue;
            };
            let field = field.trim().to_ascii_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    if last_was_rule {
                        current_agents.clear();
                    }
                    let agent = value.to_lowercase();
                    groups.entry(agent.clone()).or_default();
                    current_agents.push(agent);
                    last_was_rule = false;
                }
                "allow" | "disallow" => {
                    // An empty value places no restriction but still closes the agent list
                    if !value.is_empty() {
                        let rule = Rule {
                            prefix: encode_rule_path(value).to_lowercase(),
                            allow: field == "allow",
                        };
                        for agent in &current_agents {
                            if let Some(group) = groups.get_mut(agent) {
                                group.rules.push(rule.clone());
                            }
                        }
                    }
                    last_was_rule = true;
                }
                _ => {}
            }
        }

        Self { groups }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used when robots.txt cannot be fetched or is not a success response.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Returns true if a group exists for exactly this agent (or `*`)
    pub fn has_group(&self, user_agent: &str) -> bool {
        self.groups.contains_key(&user_agent.to_lowercase())
    }

    /// Number of distinct agent groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Checks if a path is allowed for the given user agent
    ///
    /// The group for the exact agent string is used when present, otherwise
    /// the `*` group. Only one group is ever consulted: an agent group with no
    /// matching prefix allows the path without looking at `*`. With no group
    /// at all the path is allowed.
    ///
    /// # Arguments
    ///
    /// * `path` - Path plus query (e.g. "/page.html?x=1")
    /// * `user_agent` - The declared agent string
    pub fn is_allowed(&self, path: &str, user_agent: &str) -> bool {
        let group = self
            .groups
            .get(&user_agent.to_lowercase())
            .or_else(|| self.groups.get("*"));

        match group {
            Some(group) => group.decide(&path.to_lowercase()).unwrap_or(true),
            None => true,
        }
    }
}
