//! The policy-document model. Documents arrive as literal JSON, are
//! validated on `CreatePolicy`, and are re-parsed for evaluation on every
//! authorised request.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Code};

/// The only document version this revision accepts.
pub const POLICY_VERSION: &str = "2012-10-17";

/// A policy-evaluation decision. The default is deny.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Decision {
    /// The request is permitted.
    Allow,
    /// The request is refused.
    #[default]
    Deny,
}

/// A field that AWS serialises as either a bare string or an array of
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    /// Single value.
    One(String),
    /// Multiple values.
    Many(Vec<String>),
}

impl StringOrList {
    /// Iterates the contained values.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        match self {
            StringOrList::One(s) => std::slice::from_ref(s).iter(),
            StringOrList::Many(v) => v.iter(),
        }
        .map(String::as_str)
    }

    /// True when no values are present (empty string or empty array).
    pub fn is_empty(&self) -> bool {
        match self {
            StringOrList::One(s) => s.is_empty(),
            StringOrList::Many(v) => v.is_empty(),
        }
    }
}

impl Default for StringOrList {
    fn default() -> Self {
        StringOrList::Many(Vec::new())
    }
}

/// One policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Optional statement ID.
    #[serde(rename = "Sid", default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// `Allow` or `Deny`; anything else fails closed.
    #[serde(rename = "Effect")]
    pub effect: String,
    /// Actions the statement covers.
    #[serde(rename = "Action")]
    pub action: StringOrList,
    /// Resources the statement covers.
    #[serde(rename = "Resource")]
    pub resource: StringOrList,
}

/// A parsed policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Document version; must equal [`POLICY_VERSION`].
    #[serde(rename = "Version")]
    pub version: String,
    /// The statements, in order.
    #[serde(rename = "Statement")]
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    /// Parses and validates a literal document. Every failure is a
    /// `MalformedPolicyDocument`.
    pub fn parse(raw: &str) -> Result<PolicyDocument, ApiError> {
        let doc: PolicyDocument = serde_json::from_str(raw).map_err(|e| {
            ApiError::with_message(Code::MalformedPolicyDocument, format!("invalid JSON: {e}"))
        })?;
        doc.validate()?;
        Ok(doc)
    }

    /// Checks the structural rules: supported version, at least one
    /// statement, a known effect and non-empty action/resource sets per
    /// statement.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.version != POLICY_VERSION {
            return Err(ApiError::with_message(
                Code::MalformedPolicyDocument,
                format!("unsupported policy version {:?}", self.version),
            ));
        }
        if self.statement.is_empty() {
            return Err(ApiError::with_message(
                Code::MalformedPolicyDocument,
                "policy has no statements",
            ));
        }
        for stmt in &self.statement {
            if stmt.effect != "Allow" && stmt.effect != "Deny" {
                return Err(ApiError::with_message(
                    Code::MalformedPolicyDocument,
                    format!("unknown effect {:?}", stmt.effect),
                ));
            }
            if stmt.action.is_empty() {
                return Err(ApiError::with_message(
                    Code::MalformedPolicyDocument,
                    "statement has an empty Action",
                ));
            }
            if stmt.resource.is_empty() {
                return Err(ApiError::with_message(
                    Code::MalformedPolicyDocument,
                    "statement has an empty Resource",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_string_and_array_forms() {
        let doc = PolicyDocument::parse(
            r#"{
                "Version": "2012-10-17",
                "Statement": [
                    {"Effect": "Allow", "Action": "ec2:*", "Resource": "*"},
                    {"Effect": "Deny", "Action": ["ec2:TerminateInstances"],
                     "Resource": ["*", "arn:aws:ec2:::instance/*"]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.statement.len(), 2);
        assert_eq!(doc.statement[0].action.iter().collect::<Vec<_>>(), ["ec2:*"]);
        assert_eq!(doc.statement[1].resource.iter().count(), 2);
    }

    #[test]
    fn rejects_wrong_version() {
        let err = PolicyDocument::parse(
            r#"{"Version": "2008-10-17", "Statement": [
                {"Effect": "Allow", "Action": "*", "Resource": "*"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.code, Code::MalformedPolicyDocument);
    }

    #[test]
    fn rejects_empty_statements_and_sets() {
        assert_eq!(
            PolicyDocument::parse(r#"{"Version": "2012-10-17", "Statement": []}"#)
                .unwrap_err()
                .code,
            Code::MalformedPolicyDocument
        );
        assert_eq!(
            PolicyDocument::parse(
                r#"{"Version": "2012-10-17", "Statement": [
                    {"Effect": "Allow", "Action": [], "Resource": "*"}]}"#
            )
            .unwrap_err()
            .code,
            Code::MalformedPolicyDocument
        );
        assert_eq!(
            PolicyDocument::parse(
                r#"{"Version": "2012-10-17", "Statement": [
                    {"Effect": "Maybe", "Action": "*", "Resource": "*"}]}"#
            )
            .unwrap_err()
            .code,
            Code::MalformedPolicyDocument
        );
    }
}
