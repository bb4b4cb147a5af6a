//! Translation of EC2 Query API requests into VDC calls.

use tracing::info;

use crate::{
    config::AdapterConfig,
    vdc::{ImageRecord, InstanceRecord, VdcApi},
    Result,
};

pub mod actions;
pub mod params;
pub mod render;
pub mod xml;

pub use params::Params;

pub const XMLNS: &str = "http://ec2.amazonaws.com/doc/2011-07-15/";

/// A decoded inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub action: String,
    pub params: Params,
}

impl Request {
    /// The `Action` parameter names the action; `fallback` (the request path)
    /// is used only when the parameter is absent.
    pub fn new(params: Params, fallback: Option<&str>) -> Self {
        let action = params.scalar("Action", fallback.unwrap_or_default());
        Self { action, params }
    }

    pub fn account_id(&self) -> &str {
        self.params.get("AWSAccessKeyId").unwrap_or_default()
    }
}

/// Everything a translator reads while serving one request.
pub struct Context<'a> {
    pub vdc: &'a dyn VdcApi,
    pub config: &'a AdapterConfig,
    pub params: &'a Params,
    pub account_id: &'a str,
}

/// Normalized translator output, consumed by [`render::render`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    RunInstances {
        account_id: String,
        instances: Vec<InstanceRecord>,
    },
    TerminateInstances {
        instance_ids: Vec<String>,
    },
    DescribeInstances {
        account_id: String,
        instances: Vec<InstanceRecord>,
    },
    DescribeImages {
        images: Vec<ImageRecord>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// An EC2 XML response document
    Document(String),
    /// The plain-text answer to an action with no translator
    Unsupported(String),
}

impl Reply {
    pub fn unsupported(action: &str) -> Self {
        Reply::Unsupported(format!("Error: Unsupported Action: {action}\n"))
    }
}

pub async fn dispatch(
    vdc: &dyn VdcApi,
    config: &AdapterConfig,
    request: &Request,
) -> Result<Reply> {
    if config.verbose_requests {
        let mut params: Vec<_> = request.params.iter().collect();
        params.sort_unstable();
        info!(action = %request.action, ?params, "EC2 request");
    }

    let Some(translator) = actions::lookup(&request.action) else {
        info!(action = %request.action, "unsupported action");
        return Ok(Reply::unsupported(&request.action));
    };

    let ctx = Context {
        vdc,
        config,
        params: &request.params,
        account_id: request.account_id(),
    };
    let outcome = translator.translate(&ctx).await?;
    Ok(Reply::Document(render::render(&outcome, &config.hypervisor)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ec2::actions::tests::FakeVdc;

    fn request(pairs: &[(&str, &str)], fallback: Option<&str>) -> Request {
        let params = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Request::new(params, fallback)
    }

    #[test]
    fn test_action_selection() {
        assert_eq!(request(&[("Action", "DescribeImages")], None).action, "DescribeImages");
        assert_eq!(request(&[], Some("RunInstances")).action, "RunInstances");
        assert_eq!(
            request(&[("Action", "DescribeImages")], Some("RunInstances")).action,
            "DescribeImages"
        );
        assert_eq!(request(&[], None).action, "");
    }

    #[tokio::test]
    async fn test_unsupported_action() {
        let vdc = FakeVdc::default();
        let reply = dispatch(
            &vdc,
            &AdapterConfig::default(),
            &request(&[("Action", "Foo"), ("AWSAccessKeyId", "a-1")], None),
        )
        .await
        .unwrap();

        assert_eq!(reply, Reply::Unsupported("Error: Unsupported Action: Foo\n".to_string()));
        assert!(vdc.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_renders_document() {
        let vdc = FakeVdc::default().with_images(&["wmi-lucid0", "wmi-lucid1"]);
        let config = AdapterConfig {
            verbose_requests: true,
            ..Default::default()
        };
        let reply = dispatch(
            &vdc,
            &config,
            &request(&[("Action", "DescribeImages"), ("ImageId.1", "wmi-lucid1")], None),
        )
        .await
        .unwrap();

        let Reply::Document(body) = reply else {
            panic!("expected a document, got {reply:?}");
        };
        assert!(body.contains("<DescribeImagesResponse xmlns=\"http://ec2.amazonaws.com/doc/2011-07-15/\">"));
        assert!(body.contains("<imageId>wmi-lucid1</imageId>"));
        assert!(!body.contains("wmi-lucid0"));
    }

    #[tokio::test]
    async fn test_translator_failure_propagates() {
        let vdc = FakeVdc::default().failing_after(0);
        let err = dispatch(
            &vdc,
            &AdapterConfig::default(),
            &request(&[("Action", "DescribeInstances")], None),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "InternalError");
    }
}
