//! The error catalogue: a closed, process-wide mapping from symbolic code
//! to HTTP status and human message. The catalogue is the single source of
//! truth for outward error shape; the gateway's envelope renderers consume
//! it and nothing else.

use http::StatusCode;
use thiserror::Error;

/// Every error code the control plane can put on the wire.
///
/// Collaborators on the bus raise errors by code *string*; [`Code::parse`]
/// maps those back into the catalogue and unknown strings are remapped to
/// [`Code::InternalError`] by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Code {
    MissingAuthenticationToken,
    IncompleteSignature,
    SignatureDoesNotMatch,
    InvalidClientTokenId,
    AccessDenied,
    InvalidAction,
    InvalidParameter,
    MissingParameter,
    UnsupportedOperation,
    EntityAlreadyExists,
    NoSuchEntity,
    DeleteConflict,
    LimitExceeded,
    MalformedPolicyDocument,
    DependencyViolation,
    InvalidInternetGatewayIdNotFound,
    ResourceAlreadyAssociated,
    GatewayNotAttached,
    ServiceUnavailable,
    Throttling,
    InternalError,
    ServerInternal,
}

impl Code {
    /// The stable wire spelling of this code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Code::MissingAuthenticationToken => "MissingAuthenticationToken",
            Code::IncompleteSignature => "IncompleteSignature",
            Code::SignatureDoesNotMatch => "SignatureDoesNotMatch",
            Code::InvalidClientTokenId => "InvalidClientTokenId",
            Code::AccessDenied => "AccessDenied",
            Code::InvalidAction => "InvalidAction",
            Code::InvalidParameter => "InvalidParameter",
            Code::MissingParameter => "MissingParameter",
            Code::UnsupportedOperation => "UnsupportedOperation",
            Code::EntityAlreadyExists => "EntityAlreadyExists",
            Code::NoSuchEntity => "NoSuchEntity",
            Code::DeleteConflict => "DeleteConflict",
            Code::LimitExceeded => "LimitExceeded",
            Code::MalformedPolicyDocument => "MalformedPolicyDocument",
            Code::DependencyViolation => "DependencyViolation",
            Code::InvalidInternetGatewayIdNotFound => "InvalidInternetGatewayID.NotFound",
            Code::ResourceAlreadyAssociated => "Resource.AlreadyAssociated",
            Code::GatewayNotAttached => "Gateway.NotAttached",
            Code::ServiceUnavailable => "ServiceUnavailable",
            Code::Throttling => "Throttling",
            Code::InternalError => "InternalError",
            Code::ServerInternal => "ServerInternal",
        }
    }

    /// Parses a wire spelling back into the catalogue.
    pub fn parse(s: &str) -> Option<Code> {
        let code = match s {
            "MissingAuthenticationToken" => Code::MissingAuthenticationToken,
            "IncompleteSignature" => Code::IncompleteSignature,
            "SignatureDoesNotMatch" => Code::SignatureDoesNotMatch,
            "InvalidClientTokenId" => Code::InvalidClientTokenId,
            "AccessDenied" => Code::AccessDenied,
            "InvalidAction" => Code::InvalidAction,
            "InvalidParameter" => Code::InvalidParameter,
            "MissingParameter" => Code::MissingParameter,
            "UnsupportedOperation" => Code::UnsupportedOperation,
            "EntityAlreadyExists" => Code::EntityAlreadyExists,
            "NoSuchEntity" => Code::NoSuchEntity,
            "DeleteConflict" => Code::DeleteConflict,
            "LimitExceeded" => Code::LimitExceeded,
            "MalformedPolicyDocument" => Code::MalformedPolicyDocument,
            "DependencyViolation" => Code::DependencyViolation,
            "InvalidInternetGatewayID.NotFound" => Code::InvalidInternetGatewayIdNotFound,
            "Resource.AlreadyAssociated" => Code::ResourceAlreadyAssociated,
            "Gateway.NotAttached" => Code::GatewayNotAttached,
            "ServiceUnavailable" => Code::ServiceUnavailable,
            "Throttling" => Code::Throttling,
            "InternalError" => Code::InternalError,
            "ServerInternal" => Code::ServerInternal,
            _ => return None,
        };
        Some(code)
    }

    /// The HTTP status this code maps to. Codes outside the table would
    /// default to 500, but the catalogue is closed so every variant is
    /// listed.
    pub fn http_status(self) -> StatusCode {
        match self {
            Code::MissingAuthenticationToken
            | Code::SignatureDoesNotMatch
            | Code::InvalidClientTokenId
            | Code::AccessDenied => StatusCode::FORBIDDEN,
            Code::IncompleteSignature
            | Code::InvalidAction
            | Code::InvalidParameter
            | Code::MissingParameter
            | Code::UnsupportedOperation
            | Code::MalformedPolicyDocument
            | Code::DependencyViolation
            | Code::InvalidInternetGatewayIdNotFound
            | Code::ResourceAlreadyAssociated
            | Code::GatewayNotAttached => StatusCode::BAD_REQUEST,
            Code::EntityAlreadyExists | Code::DeleteConflict | Code::LimitExceeded => {
                StatusCode::CONFLICT
            }
            Code::NoSuchEntity => StatusCode::NOT_FOUND,
            Code::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Code::Throttling => StatusCode::TOO_MANY_REQUESTS,
            Code::InternalError | Code::ServerInternal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The catalogue's human message for this code.
    pub const fn default_message(self) -> &'static str {
        match self {
            Code::MissingAuthenticationToken => {
                "Request is missing authentication token or credentials"
            }
            Code::IncompleteSignature => "The request signature is incomplete or malformed",
            Code::SignatureDoesNotMatch => {
                "The request signature we calculated does not match the signature you provided"
            }
            Code::InvalidClientTokenId => {
                "The security token included in the request is invalid"
            }
            Code::AccessDenied => "You are not authorized to perform this operation",
            Code::InvalidAction => "The requested action is not valid for this service",
            Code::InvalidParameter => "A parameter specified in the request is not valid",
            Code::MissingParameter => "A required parameter is missing from the request",
            Code::UnsupportedOperation => "The requested operation is not supported",
            Code::EntityAlreadyExists => "An entity with the same name already exists",
            Code::NoSuchEntity => "The requested entity does not exist",
            Code::DeleteConflict => "The entity cannot be deleted while references remain",
            Code::LimitExceeded => "The request would exceed a service limit",
            Code::MalformedPolicyDocument => "The policy document is malformed",
            Code::DependencyViolation => "A dependent resource prevents this operation",
            Code::InvalidInternetGatewayIdNotFound => {
                "The specified internet gateway does not exist"
            }
            Code::ResourceAlreadyAssociated => "The resource is already associated",
            Code::GatewayNotAttached => "The gateway is not attached to the VPC",
            Code::ServiceUnavailable => "The service is temporarily unavailable",
            Code::Throttling => "Request rate exceeded, slow down",
            Code::InternalError => "An internal error has occurred",
            Code::ServerInternal => "An internal server error occurred",
        }
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type carried through every control-plane path: a catalogue
/// code plus the message that goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// The catalogue code.
    pub code: Code,
    /// The outward message.
    pub message: String,
}

impl ApiError {
    /// An error carrying the catalogue's default message.
    pub fn new(code: Code) -> ApiError {
        ApiError {
            code,
            message: code.default_message().to_string(),
        }
    }

    /// An error with an operation-specific message.
    pub fn with_message(code: Code, message: impl Into<String>) -> ApiError {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// The HTTP status for this error.
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl From<Code> for ApiError {
    fn from(code: Code) -> Self {
        ApiError::new(code)
    }
}

impl From<hive_codec::query::DecodeError> for ApiError {
    fn from(err: hive_codec::query::DecodeError) -> Self {
        ApiError::with_message(Code::InvalidParameter, err.to_string())
    }
}

impl From<hive_codec::xml::EncodeError> for ApiError {
    fn from(err: hive_codec::xml::EncodeError) -> Self {
        ApiError::with_message(Code::InternalError, err.to_string())
    }
}
