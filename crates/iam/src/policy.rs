//! The policy evaluator: AWS semantics with explicit-deny-wins and a
//! default of deny. The decision trace is logged by callers, never
//! returned to clients.

use hive_types::iam::policy::{Decision, PolicyDocument};

/// The identity that bypasses evaluation entirely.
pub const ROOT_IDENTITY: &str = "root";

/// Evaluates one qualified action (`"<service>:<Action>"`) against a
/// resource for an identity holding the given policy documents.
///
/// Root is always allowed. Otherwise every statement is scanned; a
/// matching `Deny` wins immediately, a matching `Allow` is recorded, and
/// an unknown effect fails closed. The final decision is `Allow` iff an
/// allow matched and no deny did.
pub fn evaluate_access(
    identity: &str,
    action: &str,
    resource: &str,
    documents: &[PolicyDocument],
) -> Decision {
    if identity == ROOT_IDENTITY {
        return Decision::Allow;
    }

    let mut allowed = false;
    for doc in documents {
        for stmt in &doc.statement {
            let matches = stmt.action.iter().any(|p| wildcard_match(p, action))
                && stmt.resource.iter().any(|p| wildcard_match(p, resource));
            if !matches {
                continue;
            }
            match stmt.effect.as_str() {
                "Deny" => return Decision::Deny,
                "Allow" => allowed = true,
                // Fail closed on anything else.
                _ => return Decision::Deny,
            }
        }
    }

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Wildcard matching as policies use it, uniform across actions and
/// resources: `*` matches everything, `<prefix>*` matches by prefix,
/// anything else compares exactly. All comparisons are case-insensitive,
/// and no other glob metacharacters are honoured.
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return value.len() >= prefix.len()
            && value.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes());
    }
    pattern.eq_ignore_ascii_case(value)
}
