use std::{fmt::Display, future::Future};

use anyhow::Context;
use url::Url;

use crate::{
    action::{
        ActionPayload, ActionRequest, ArgumentScanner, ScannableArguments, SoapMessage,
        WritableArguments,
    },
    service::ServiceDescriptor,
};

pub const SOAP_CONTENT_TYPE: &str = r#"text/xml; charset="utf-8""#;

/// Fully built control request. Transport only needs to send it
#[derive(Debug, Clone)]
pub struct SoapRequest {
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl SoapRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// HTTP capability used to POST control requests.
///
/// Timeouts, TLS and redirects are configured by whoever constructs the transport.
pub trait HttpTransport: Send + Sync {
    /// Send the request and return the full response body
    fn post(
        &self,
        request: SoapRequest,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

impl HttpTransport for reqwest::Client {
    fn post(
        &self,
        request: SoapRequest,
    ) -> impl Future<Output = Result<String, TransportError>> + Send {
        async move {
            let mut builder = self.request(reqwest::Method::POST, request.url);
            for (name, value) in request.headers {
                builder = builder.header(name, value);
            }
            let res = builder.body(request.body).send().await?;
            tracing::trace!("Control response status: {}", res.status());
            Ok(res.text().await?)
        }
    }
}

#[derive(Debug)]
pub struct TransportError(anyhow::Error);

impl TransportError {
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        Self(err.into())
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        Self(value.into())
    }
}

#[derive(Debug)]
pub enum ActionCallError {
    /// Service does not declare the action
    NotSupported(String),
    /// Arguments do not match the declared input of the action
    InvalidArguments(String),
    /// HTTP exchange did not complete
    Transport(TransportError),
    /// Response lacks the expected action response element.
    /// Device faults end up here as well
    UnexpectedResponse(String),
    Other(anyhow::Error),
}

pub type ActionCallResult<T> = Result<T, ActionCallError>;

impl Display for ActionCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionCallError::NotSupported(action) => write!(f, "Action {action} not supported"),
            ActionCallError::InvalidArguments(reason) => write!(f, "Invalid arguments: {reason}"),
            ActionCallError::Transport(e) => write!(f, "Http error: {e}"),
            ActionCallError::UnexpectedResponse(reason) => {
                write!(f, "Unexpected response: {reason}")
            }
            ActionCallError::Other(e) => write!(f, "Other: {e}"),
        }
    }
}

impl std::error::Error for ActionCallError {}

impl From<TransportError> for ActionCallError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

impl From<reqwest::Error> for ActionCallError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.into())
    }
}

impl From<anyhow::Error> for ActionCallError {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value)
    }
}

/// Control endpoint of one service on one device.
///
/// Executes every action of the service the same way: envelope in, envelope out.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    service_urn: String,
    control_url: Url,
    event_url: Url,
}

impl ServiceClient {
    /// Resolve service endpoints against the device base url
    pub fn new(base_url: &Url, service: &ServiceDescriptor) -> anyhow::Result<Self> {
        anyhow::ensure!(
            service.urn.is_service(),
            "{} is not a service type",
            service.urn
        );
        let control_url = base_url
            .join(&service.control_path)
            .with_context(|| format!("resolve control path {}", service.control_path))?;
        let event_url = base_url
            .join(&service.event_path)
            .with_context(|| format!("resolve event path {}", service.event_path))?;
        Ok(Self {
            service_urn: service.urn.to_string(),
            control_url,
            event_url,
        })
    }

    pub fn service_urn(&self) -> &str {
        &self.service_urn
    }

    pub fn control_url(&self) -> &Url {
        &self.control_url
    }

    pub fn event_url(&self) -> &Url {
        &self.event_url
    }

    /// Build the HTTP request invoking `action_name`
    pub fn build_request<A: WritableArguments>(
        &self,
        action_name: &str,
        arguments: &A,
    ) -> anyhow::Result<SoapRequest> {
        let body = SoapMessage::new(ActionRequest {
            action_name,
            service_urn: &self.service_urn,
            arguments,
        })
        .into_xml()?;
        Ok(SoapRequest {
            url: self.control_url.clone(),
            headers: vec![
                ("Content-Type", SOAP_CONTENT_TYPE.to_owned()),
                ("SOAPAction", format!("{}#{}", self.service_urn, action_name)),
            ],
            body,
        })
    }

    /// Run the action and return its response arguments without interpreting them
    pub async fn run_action_raw<T: HttpTransport, A: WritableArguments>(
        &self,
        transport: &T,
        action_name: &str,
        arguments: &A,
    ) -> ActionCallResult<ArgumentScanner> {
        let request = self.build_request(action_name, arguments)?;
        tracing::trace!("Sending {action_name} action to {}", self.control_url);
        let body = transport.post(request).await?;
        parse_response(action_name, &body)
    }

    pub async fn run_action<T, A, R>(
        &self,
        transport: &T,
        action_name: &str,
        arguments: &A,
    ) -> ActionCallResult<R>
    where
        T: HttpTransport,
        A: WritableArguments,
        R: ScannableArguments,
    {
        let mut scanner = self
            .run_action_raw(transport, action_name, arguments)
            .await?;
        R::scan_arguments(&mut scanner)
    }
}

/// Find `<ActionName>Response` inside the response envelope
pub fn parse_response(action_name: &str, body: &str) -> ActionCallResult<ArgumentScanner> {
    let expected = format!("{action_name}Response");
    let payload = match SoapMessage::<ActionPayload>::from_xml(body.as_bytes()) {
        Ok(message) => message.into_inner(),
        Err(e) => {
            tracing::trace!("Undecodable {action_name} response: {body}");
            return Err(ActionCallError::UnexpectedResponse(format!(
                "{expected} is not found: {e:#}"
            )));
        }
    };
    if payload.name != expected {
        tracing::trace!("Unexpected {action_name} response: {body}");
        return Err(ActionCallError::UnexpectedResponse(format!(
            "expected {expected}, got {}",
            payload.name
        )));
    }
    Ok(ArgumentScanner::new(action_name, payload.arguments))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use url::Url;

    use crate::{
        action::{ArgumentScanner, ArgumentWriter, ScannableArguments, WritableArguments},
        service::ServiceDescriptor,
        urn::URN,
    };

    use super::{
        parse_response, ActionCallError, HttpTransport, ServiceClient, SoapRequest,
        TransportError,
    };

    /// Replies with canned body and remembers what was sent
    #[derive(Debug, Default)]
    pub struct StubTransport {
        pub response: Option<String>,
        pub requests: Arc<Mutex<Vec<SoapRequest>>>,
    }

    impl StubTransport {
        pub fn replying(body: impl Into<String>) -> Self {
            Self {
                response: Some(body.into()),
                requests: Arc::default(),
            }
        }

        pub fn unreachable() -> Self {
            Self::default()
        }

        pub fn last_request(&self) -> SoapRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl HttpTransport for StubTransport {
        async fn post(&self, request: SoapRequest) -> Result<String, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.response
                .clone()
                .ok_or_else(|| TransportError::new(anyhow::anyhow!("connection refused")))
        }
    }

    pub fn envelope(body: &str) -> String {
        format!(
            r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body>{body}</s:Body></s:Envelope>"#
        )
    }

    fn rendering_control() -> ServiceClient {
        let base = Url::parse("http://192.168.1.20:1400/xml/device_description.xml").unwrap();
        let service = ServiceDescriptor {
            name: "RenderingControl".into(),
            urn: "urn:schemas-upnp-org:service:RenderingControl:1"
                .parse::<URN>()
                .unwrap(),
            control_path: "/MediaRenderer/RenderingControl/Control".into(),
            event_path: "/MediaRenderer/RenderingControl/Event".into(),
        };
        ServiceClient::new(&base, &service).unwrap()
    }

    struct GetVolume {
        instance_id: u32,
    }

    impl WritableArguments for GetVolume {
        fn write_arguments(&self, w: &mut ArgumentWriter<'_>) -> anyhow::Result<()> {
            w.write_argument("InstanceID", &self.instance_id)
        }
    }

    #[derive(Debug)]
    struct CurrentVolume(u16);

    impl ScannableArguments for CurrentVolume {
        fn scan_arguments(scanner: &mut ArgumentScanner) -> Result<Self, ActionCallError> {
            Ok(Self(scanner.next("CurrentVolume")?))
        }
    }

    #[test]
    fn resolve_endpoints() {
        let client = rendering_control();
        assert_eq!(
            client.control_url().as_str(),
            "http://192.168.1.20:1400/MediaRenderer/RenderingControl/Control"
        );
        assert_eq!(
            client.event_url().as_str(),
            "http://192.168.1.20:1400/MediaRenderer/RenderingControl/Event"
        );
    }

    #[tokio::test]
    async fn run_action_headers_and_response() {
        let client = rendering_control();
        let transport = StubTransport::replying(envelope(
            r#"<u:GetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1"><CurrentVolume>42</CurrentVolume></u:GetVolumeResponse>"#,
        ));
        let volume: CurrentVolume = client
            .run_action(&transport, "GetVolume", &GetVolume { instance_id: 0 })
            .await
            .unwrap();
        assert_eq!(volume.0, 42);

        let request = transport.last_request();
        assert_eq!(request.url, *client.control_url());
        assert_eq!(
            request.header("content-type"),
            Some(r#"text/xml; charset="utf-8""#)
        );
        assert_eq!(
            request.header("SOAPAction"),
            Some("urn:schemas-upnp-org:service:RenderingControl:1#GetVolume")
        );
        assert!(request.body.starts_with(r#"<?xml version="1.0"?><s:Envelope"#));
        assert!(request.body.contains("<InstanceID>0</InstanceID>"));
    }

    #[tokio::test]
    async fn fault_is_unexpected_response() {
        let client = rendering_control();
        let transport = StubTransport::replying(envelope(
            r#"<s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>402</errorCode></UPnPError></detail></s:Fault>"#,
        ));
        let err = client
            .run_action::<_, _, CurrentVolume>(&transport, "GetVolume", &GetVolume { instance_id: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, ActionCallError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn garbage_is_unexpected_response() {
        let client = rendering_control();
        let transport = StubTransport::replying("<html>Bad gateway</html>");
        let err = client
            .run_action::<_, _, CurrentVolume>(&transport, "GetVolume", &GetVolume { instance_id: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, ActionCallError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn missing_out_argument_is_unexpected_response() {
        let client = rendering_control();
        let transport = StubTransport::replying(envelope(
            r#"<u:GetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1"></u:GetVolumeResponse>"#,
        ));
        let err = client
            .run_action::<_, _, CurrentVolume>(&transport, "GetVolume", &GetVolume { instance_id: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, ActionCallError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let client = rendering_control();
        let transport = StubTransport::unreachable();
        let err = client
            .run_action::<_, _, CurrentVolume>(&transport, "GetVolume", &GetVolume { instance_id: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, ActionCallError::Transport(_)));
    }

    #[test]
    fn cdata_response_argument() {
        let body = envelope(
            r#"<u:BrowseResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1"><Result><![CDATA[<DIDL-Lite/>]]></Result><Title>Tom <![CDATA[& Jerry]]> &amp; co</Title><TotalMatches>1</TotalMatches></u:BrowseResponse>"#,
        );
        let mut scanner = parse_response("Browse", &body).unwrap();
        assert_eq!(scanner.next::<String>("Result").unwrap(), "<DIDL-Lite/>");
        assert_eq!(scanner.next::<String>("Title").unwrap(), "Tom & Jerry & co");
        let remaining: Vec<_> = scanner.remaining().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(remaining, ["TotalMatches"]);
    }

    #[test]
    fn device_urn_is_rejected() {
        let base = Url::parse("http://192.168.1.20:1400/").unwrap();
        let service = ServiceDescriptor {
            name: "MediaRenderer".into(),
            urn: "urn:schemas-upnp-org:device:MediaRenderer:1"
                .parse::<URN>()
                .unwrap(),
            control_path: "/MediaRenderer/Control".into(),
            event_path: "/MediaRenderer/Event".into(),
        };
        assert!(ServiceClient::new(&base, &service).is_err());
    }
}
