//! AWS wire shapes for every dispatched action. Shapes are declared with
//! `hive_codec::aws_shape!`, which gives each one a query-decode face, an
//! XML-encode face, and a serde face for the control bus.

use hive_codec::aws_shape;

/// Account-service shapes.
pub mod account;
/// EC2-service shapes.
pub mod ec2;
/// IAM-service shapes.
pub mod iam;

/// The service a request was signed for, taken from the SigV4 credential
/// scope. Selects the sub-dispatcher and the XML envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceTag {
    /// The EC2 compute surface.
    Ec2,
    /// The IAM identity surface.
    Iam,
    /// The Hive account-management surface.
    Account,
}

impl ServiceTag {
    /// Parses the credential-scope service segment. Unrecognised tags are
    /// rejected by the dispatcher as `UnsupportedOperation`.
    pub fn parse(s: &str) -> Option<ServiceTag> {
        match s {
            "ec2" => Some(ServiceTag::Ec2),
            "iam" => Some(ServiceTag::Iam),
            "account" => Some(ServiceTag::Account),
            _ => None,
        }
    }

    /// The scope spelling of the tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            ServiceTag::Ec2 => "ec2",
            ServiceTag::Iam => "iam",
            ServiceTag::Account => "account",
        }
    }
}

impl std::fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The qualified IAM action string for a service/action pair, as consumed
/// by the policy evaluator. Unknown actions still form `"<svc>:<Action>"`
/// so that blanket `"<svc>:*"` policies apply.
pub fn qualified_action(service: ServiceTag, action: &str) -> String {
    format!("{}:{}", service.as_str(), action)
}

aws_shape! {
    /// One resource tag.
    pub struct Tag {
        key: Option<String> => "Key" | "key",
        value: Option<String> => "Value" | "value",
    }
}

aws_shape! {
    /// Tags applied to a resource class at creation time.
    pub struct TagSpecification {
        resource_type: Option<String> => "ResourceType" | "resourceType",
        tags: Vec<Tag> => "Tag" | "tagSet",
    }
}

aws_shape! {
    /// A describe-call filter: a name and the values it matches.
    pub struct Filter {
        name: Option<String> => "Name",
        values: Vec<String> => "Value",
    }
}

aws_shape! {
    /// The shared `<Return>true</Return>` result for mutations with no
    /// payload.
    pub struct ReturnOutput {
        success: bool => "Return" | "return",
    }
}

impl ReturnOutput {
    /// The affirmative result.
    pub fn ok() -> ReturnOutput {
        ReturnOutput { success: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_action_forms_service_colon_action() {
        assert_eq!(
            qualified_action(ServiceTag::Ec2, "DescribeInstances"),
            "ec2:DescribeInstances"
        );
        assert_eq!(
            qualified_action(ServiceTag::Iam, "CreateUser"),
            "iam:CreateUser"
        );
    }

    #[test]
    fn unknown_service_tags_do_not_parse() {
        assert_eq!(ServiceTag::parse("s3"), None);
        assert_eq!(ServiceTag::parse("ec2"), Some(ServiceTag::Ec2));
    }
}
