//! Well-formedness rules for names and namespace components.

use crate::error::{ErrorKind, Result};

/// Prefixes that, followed by nothing but digits, look like a data type name.
const DATA_TYPE_LIKE: &[&str] = &["bool", "uint", "int", "void", "float"];
const KEYWORD_LIKE: &[&str] = &["saturated", "truncated"];
/// Reserved by common operating systems as file names.
const OS_RESERVED: &[&str] = &["con", "prn", "aux", "nul"];
/// Reserved by common operating systems when followed by at most one digit.
const OS_RESERVED_NUMBERED: &[&str] = &["com", "lpt"];

/// Checks one name or one dotted component of a namespaced name.
pub fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => {
            return Err(ErrorKind::InvalidName(
                "Name or namespace component cannot be empty".to_string(),
            )
            .into())
        }
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(ErrorKind::InvalidName(format!(
            "Name or namespace component cannot start with {:?}",
            first
        ))
        .into());
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(ErrorKind::InvalidName(format!("Name cannot contain {:?}", c)).into());
    }
    if let Some(reason) = disallowed_reason(&name.to_ascii_lowercase()) {
        return Err(ErrorKind::InvalidName(format!("Disallowed name {:?}: {}", name, reason)).into());
    }
    Ok(())
}

fn disallowed_reason(lower: &str) -> Option<&'static str> {
    let digits_only = |rest: &str| rest.chars().all(|c| c.is_ascii_digit());
    if DATA_TYPE_LIKE
        .iter()
        .any(|p| lower.strip_prefix(p).is_some_and(digits_only))
    {
        return Some("looks like a data type name");
    }
    if KEYWORD_LIKE.contains(&lower) {
        return Some("looks like a keyword");
    }
    if OS_RESERVED.contains(&lower)
        || OS_RESERVED_NUMBERED.iter().any(|p| {
            lower
                .strip_prefix(p)
                .is_some_and(|rest| rest.len() <= 1 && digits_only(rest))
        })
    {
        return Some("reserved by the operating system");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(name: &str) -> String {
        check_name(name).unwrap_err().to_string().to_lowercase()
    }

    #[test]
    fn accepts_ordinary_names() {
        for name in ["Heartbeat", "uavcan", "_private", "node_id", "a1", "integer", "Int8Array", "com12", "boolean"] {
            assert!(check_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(message("").contains("empty"));
        assert!(message("0ns").contains("cannot start with"));
        assert!(message("n-s").contains("cannot contain"));
        assert!(message("ns.T").contains("cannot contain"));
    }

    #[test]
    fn rejects_reserved_names() {
        for name in ["uint8", "INT", "void16", "bool", "float64", "Saturated", "truncated", "COM1", "lpt", "nul", "con"] {
            assert!(message(name).contains("disallowed"), "{name}");
        }
    }
}
