//! The two response envelopes. Which one a request gets is a capability
//! of the per-service sub-dispatcher, so nothing else in the gateway
//! branches on the service tag for rendering.

use axum::response::Response;
use http::{header, StatusCode};
use hive_codec::xml::{ToXmlFields, XmlWriter};
use hive_types::error::ApiError;

/// EC2 response namespace.
pub const EC2_XMLNS: &str = "http://ec2.amazonaws.com/doc/2016-11-15/";
/// IAM response namespace.
pub const IAM_XMLNS: &str = "https://iam.amazonaws.com/doc/2010-05-08/";

/// The envelope renderer held by each sub-dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `<…Response>` with an inline `<requestId>`, errors as
    /// `<Response><Errors>…`.
    Ec2,
    /// `<…Response><…Result>…</…Result><ResponseMetadata>`, errors as
    /// `<ErrorResponse>`.
    Iam,
}

impl Envelope {
    /// Renders a success body for `action`.
    pub fn render_ok(
        self,
        action: &str,
        request_id: &str,
        output: &dyn ToXmlFields,
    ) -> Result<String, ApiError> {
        let mut w = XmlWriter::with_declaration()?;
        let response_tag = format!("{action}Response");
        match self {
            Envelope::Ec2 => {
                w.start_ns(&response_tag, EC2_XMLNS)?;
                w.text_element("requestId", request_id)?;
                output.write_xml_fields(&mut w)?;
                w.end(&response_tag)?;
            }
            Envelope::Iam => {
                let result_tag = format!("{action}Result");
                w.start_ns(&response_tag, IAM_XMLNS)?;
                w.start(&result_tag)?;
                output.write_xml_fields(&mut w)?;
                w.end(&result_tag)?;
                w.start("ResponseMetadata")?;
                w.text_element("RequestId", request_id)?;
                w.end("ResponseMetadata")?;
                w.end(&response_tag)?;
            }
        }
        Ok(w.into_string()?)
    }

    /// Renders an error body. Infallible: a failure inside the writer
    /// degrades to the bare code string rather than masking the error.
    pub fn render_error(self, err: &ApiError, request_id: &str) -> String {
        self.try_render_error(err, request_id)
            .unwrap_or_else(|_| err.code.as_str().to_string())
    }

    fn try_render_error(self, err: &ApiError, request_id: &str) -> Result<String, ApiError> {
        let mut w = XmlWriter::with_declaration()?;
        match self {
            Envelope::Ec2 => {
                w.start("Response")?;
                w.start("Errors")?;
                w.start("Error")?;
                w.text_element("Code", err.code.as_str())?;
                w.text_element("Message", &err.message)?;
                w.end("Error")?;
                w.end("Errors")?;
                w.text_element("RequestID", request_id)?;
                w.end("Response")?;
            }
            Envelope::Iam => {
                w.start("ErrorResponse")?;
                w.start("Error")?;
                w.text_element("Type", "Sender")?;
                w.text_element("Code", err.code.as_str())?;
                w.text_element("Message", &err.message)?;
                w.end("Error")?;
                w.text_element("RequestId", request_id)?;
                w.end("ErrorResponse")?;
            }
        }
        Ok(w.into_string()?)
    }

    /// The full error response, status from the catalogue.
    pub fn error_response(self, err: &ApiError, request_id: &str) -> Response {
        xml_response(err.http_status(), self.render_error(err, request_id))
    }
}

/// An `application/xml` response.
pub fn xml_response(status: StatusCode, body: String) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/xml")
        .body(body.into())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_types::api::iam::{ListUsersOutput, User};
    use hive_types::error::Code;

    #[test]
    fn ec2_error_envelope_shape() {
        let err = ApiError::new(Code::InvalidAction);
        let xml = Envelope::Ec2.render_error(&err, "req-1");
        assert!(xml.contains("<Response><Errors><Error><Code>InvalidAction</Code>"));
        assert!(xml.contains("<RequestID>req-1</RequestID>"));
    }

    #[test]
    fn iam_error_envelope_shape() {
        let err = ApiError::new(Code::NoSuchEntity);
        let xml = Envelope::Iam.render_error(&err, "req-2");
        assert!(xml.contains(
            "<ErrorResponse><Error><Type>Sender</Type><Code>NoSuchEntity</Code>"
        ));
        assert!(xml.contains("<RequestId>req-2</RequestId>"));
    }

    #[test]
    fn iam_success_wraps_result_and_metadata() {
        let output = ListUsersOutput {
            users: vec![User {
                user_name: Some("alice".to_string()),
                ..Default::default()
            }],
            is_truncated: false,
        };
        let xml = Envelope::Iam
            .render_ok("ListUsers", "req-3", &output)
            .unwrap();
        assert!(xml.contains("<ListUsersResponse xmlns=\"https://iam.amazonaws.com/doc/2010-05-08/\">"));
        assert!(xml.contains("<ListUsersResult><Users><item>"));
        assert!(xml.contains("<UserName>alice</UserName>"));
        assert!(xml.contains("<ResponseMetadata><RequestId>req-3</RequestId></ResponseMetadata>"));
    }

    #[test]
    fn ec2_success_inlines_request_id() {
        let output = hive_types::api::ReturnOutput::ok();
        let xml = Envelope::Ec2
            .render_ok("StartInstances", "req-4", &output)
            .unwrap();
        assert!(xml.contains("<StartInstancesResponse xmlns=\"http://ec2.amazonaws.com/doc/2016-11-15/\">"));
        assert!(xml.contains("<requestId>req-4</requestId>"));
        assert!(xml.contains("<return>true</return>"));
    }
}
