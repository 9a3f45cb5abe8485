//! Node, namespace, and topic name validation and expansion.
//!
//! Naming rules:
//! - a node name is a single token: `[A-Za-z_][A-Za-z0-9_]*`
//! - a namespace is empty, `/`, or `/`-separated tokens starting with `/`
//! - a topic or service name is `~`, `~/rest`, an absolute `/a/b`, or a
//!   relative `a/b`; every token follows the node-name rule
//!
//! Expansion resolves a topic name against a node: absolute names are used
//! as-is, relative names are prefixed with the node's namespace, and `~` is
//! replaced with the node's fully qualified name.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

fn invalid(kind: &'static str, name: &str, reason: &'static str) -> Error {
    Error::InvalidName {
        kind,
        name: name.to_string(),
        reason,
    }
}

/// Validate a node name.
pub fn validate_node_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid("node", name, "must not be empty"));
    }
    if !TOKEN_RE.is_match(name) {
        return Err(invalid(
            "node",
            name,
            "must start with a letter or underscore and contain only alphanumerics and underscores",
        ));
    }
    Ok(())
}

/// Validate a namespace. Empty and `/` both denote the root namespace.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() || namespace == "/" {
        return Ok(());
    }
    let Some(rest) = namespace.strip_prefix('/') else {
        return Err(invalid("namespace", namespace, "must start with `/`"));
    };
    if rest.ends_with('/') {
        return Err(invalid("namespace", namespace, "must not end with `/`"));
    }
    for token in rest.split('/') {
        if !TOKEN_RE.is_match(token) {
            return Err(invalid("namespace", namespace, "contains an invalid token"));
        }
    }
    Ok(())
}

/// Validate a topic or service name in any of its three forms.
pub fn validate_topic_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid("topic", name, "must not be empty"));
    }

    let body = if let Some(rest) = name.strip_prefix('~') {
        if rest.is_empty() {
            // bare `~` expands to the node's own name
            return Ok(());
        }
        let Some(rest) = rest.strip_prefix('/') else {
            return Err(invalid("topic", name, "`~` must be followed by `/`"));
        };
        rest
    } else {
        name.strip_prefix('/').unwrap_or(name)
    };

    if body.is_empty() {
        return Err(invalid("topic", name, "must contain at least one token"));
    }
    if body.ends_with('/') {
        return Err(invalid("topic", name, "must not end with `/`"));
    }
    for token in body.split('/') {
        if !TOKEN_RE.is_match(token) {
            return Err(invalid("topic", name, "contains an invalid token"));
        }
    }
    Ok(())
}

/// Build a node's fully qualified name from its namespace and name.
pub fn build_node_fqn(namespace: &str, node_name: &str) -> String {
    if namespace.is_empty() || namespace == "/" {
        format!("/{node_name}")
    } else {
        format!("{namespace}/{node_name}")
    }
}

/// Expand a topic or service name to its fully qualified form.
///
/// `namespace` may be empty (root). The input name is validated first.
pub fn expand_topic_name(namespace: &str, node_name: &str, name: &str) -> Result<String> {
    validate_topic_name(name)?;

    if let Some(rest) = name.strip_prefix('~') {
        let fqn = build_node_fqn(namespace, node_name);
        Ok(format!("{fqn}{rest}"))
    } else if name.starts_with('/') {
        Ok(name.to_string())
    } else if namespace.is_empty() || namespace == "/" {
        Ok(format!("/{name}"))
    } else {
        Ok(format!("{namespace}/{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_names() {
        assert!(validate_node_name("talker").is_ok());
        assert!(validate_node_name("_talker_2").is_ok());
        assert!(validate_node_name("").is_err());
        assert!(validate_node_name("2talker").is_err());
        assert!(validate_node_name("talk/er").is_err());
    }

    #[test]
    fn namespaces() {
        assert!(validate_namespace("").is_ok());
        assert!(validate_namespace("/").is_ok());
        assert!(validate_namespace("/robot1").is_ok());
        assert!(validate_namespace("/robot1/arm").is_ok());
        assert!(validate_namespace("robot1").is_err());
        assert!(validate_namespace("/robot1/").is_err());
        assert!(validate_namespace("//robot1").is_err());
    }

    #[test]
    fn topic_names() {
        assert!(validate_topic_name("chatter").is_ok());
        assert!(validate_topic_name("/chatter").is_ok());
        assert!(validate_topic_name("ns/chatter").is_ok());
        assert!(validate_topic_name("~").is_ok());
        assert!(validate_topic_name("~/status").is_ok());
        assert!(validate_topic_name("").is_err());
        assert!(validate_topic_name("/").is_err());
        assert!(validate_topic_name("~status").is_err());
        assert!(validate_topic_name("a//b").is_err());
        assert!(validate_topic_name("a/b/").is_err());
    }

    #[test]
    fn expansion() {
        assert_eq!(expand_topic_name("", "talker", "chatter").unwrap(), "/chatter");
        assert_eq!(
            expand_topic_name("/robot1", "talker", "chatter").unwrap(),
            "/robot1/chatter"
        );
        assert_eq!(
            expand_topic_name("/robot1", "talker", "/chatter").unwrap(),
            "/chatter"
        );
        assert_eq!(
            expand_topic_name("/robot1", "talker", "~/status").unwrap(),
            "/robot1/talker/status"
        );
        assert_eq!(expand_topic_name("", "talker", "~").unwrap(), "/talker");
    }
}
