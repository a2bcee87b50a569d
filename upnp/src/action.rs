use std::{fmt::Display, str::FromStr};

use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};

use crate::{
    local_name,
    service_client::ActionCallError,
    service_variables::{IntoUpnpValue, Value, ValueType},
    FromXml, IntoXml, XmlReaderExt, XmlWriter,
};

pub const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_ENCODING_STYLE: &str = "http://schemas.xmlsoap.org/soap/encoding/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentDirection {
    In,
    Out,
}

impl From<ArgumentDirection> for &str {
    fn from(value: ArgumentDirection) -> Self {
        match value {
            ArgumentDirection::In => "in",
            ArgumentDirection::Out => "out",
        }
    }
}

impl FromStr for ArgumentDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            rest => Err(anyhow::anyhow!("unknown argument direction: {rest}")),
        }
    }
}

impl Display for ArgumentDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let direction: &str = (*self).into();
        write!(f, "{direction}")
    }
}

/// `s:Envelope` wrapping `s:Body` with the payload inside
#[derive(Debug)]
pub struct SoapMessage<T> {
    inner: T,
}

impl<T> SoapMessage<T> {
    pub fn new(payload: T) -> Self {
        Self { inner: payload }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<'a, T: FromXml<'a>> SoapMessage<T> {
    pub fn from_xml(raw_xml: &'a [u8]) -> anyhow::Result<Self> {
        use quick_xml::Reader;
        let mut r = Reader::from_reader(raw_xml);

        let envelope = r.read_to_start()?;
        anyhow::ensure!(
            envelope.local_name().as_ref() == b"Envelope",
            "expected envelope, got {:?}",
            envelope
        );
        let body = loop {
            let start = r.read_to_start()?;
            match start.local_name().as_ref() {
                b"Body" => {}
                b"Header" => {
                    r.read_to_end(start.name())?;
                    continue;
                }
                _ => anyhow::bail!("expected body, got {:?}", start),
            }
            break start;
        };

        let payload = T::read_xml(&mut r)?;

        r.read_to_end(body.name())?;
        r.read_to_end(envelope.name())?;
        Ok(Self { inner: payload })
    }
}

impl<T: IntoXml> SoapMessage<T> {
    pub fn into_xml(self) -> anyhow::Result<String> {
        use quick_xml::Writer;
        let mut w = Writer::new(Vec::new());
        w.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        let envelope = BytesStart::new("s:Envelope").with_attributes([
            ("xmlns:s", SOAP_ENVELOPE_NAMESPACE),
            ("s:encodingStyle", SOAP_ENCODING_STYLE),
        ]);
        let envelope_end = envelope.to_end().into_owned();
        w.write_event(Event::Start(envelope.clone()))?;

        let body = BytesStart::new("s:Body");
        let body_end = body.to_end().into_owned();
        w.write_event(Event::Start(body))?;

        self.inner.write_xml(&mut w)?;

        w.write_event(Event::End(body_end))?;
        w.write_event(Event::End(envelope_end))?;
        Ok(String::from_utf8(w.into_inner())?)
    }
}

/// Writes `in` arguments of the action in their declared order
pub trait WritableArguments {
    fn write_arguments(&self, w: &mut ArgumentWriter<'_>) -> anyhow::Result<()>;
}

impl WritableArguments for () {
    fn write_arguments(&self, _w: &mut ArgumentWriter<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct ArgumentWriter<'a> {
    w: &'a mut XmlWriter,
}

impl ArgumentWriter<'_> {
    pub fn write_argument<T: IntoUpnpValue>(
        &mut self,
        name: &str,
        value: &T,
    ) -> anyhow::Result<()> {
        self.write_text(name, &value.to_xml_value())
    }

    pub fn write_value(&mut self, name: &str, value: &Value) -> anyhow::Result<()> {
        self.write_text(name, &value.to_xml_value())
    }

    fn write_text(&mut self, name: &str, text: &str) -> anyhow::Result<()> {
        let start = BytesStart::new(name);
        let end = start.to_end().into_owned();
        self.w.write_event(Event::Start(start))?;
        self.w.write_event(Event::Text(BytesText::new(text)))?;
        self.w.write_event(Event::End(end))?;
        Ok(())
    }
}

/// Action element inside the request body.
///
/// Every request carries the service type in `xmlns:u` on top of the declared arguments
#[derive(Debug)]
pub struct ActionRequest<'a, A> {
    pub action_name: &'a str,
    pub service_urn: &'a str,
    pub arguments: &'a A,
}

impl<A: WritableArguments> IntoXml for ActionRequest<'_, A> {
    fn write_xml(&self, w: &mut XmlWriter) -> anyhow::Result<()> {
        let action = BytesStart::new(format!("u:{}", self.action_name))
            .with_attributes([("xmlns:u", self.service_urn)]);
        let action_end = action.to_end().into_owned();
        w.write_event(Event::Start(action))?;

        self.arguments.write_arguments(&mut ArgumentWriter { w: &mut *w })?;

        w.write_event(Event::End(action_end))?;
        Ok(())
    }
}

/// Any action element inside the soap body, a request or a response.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPayload {
    /// Local name of the element
    pub name: String,
    /// Value of `xmlns:u` if present
    pub service_urn: Option<String>,
    pub arguments: Vec<ArgumentPayload>,
}

impl<'a> FromXml<'a> for ActionPayload {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self>
    where
        Self: Sized,
    {
        let (is_empty, action_tag) = r.read_to_start_or_empty()?;
        let name = local_name(&action_tag)?;
        let service_urn = action_tag
            .attributes()
            .flatten()
            .find(|a| a.key.as_ref() == b"xmlns:u")
            .map(|a| a.unescape_value().map(|v| v.into_owned()))
            .transpose()?;
        let mut arguments = Vec::new();

        if !is_empty {
            loop {
                match r.read_event_err_eof()? {
                    Event::Start(var) => {
                        let name = local_name(&var)?;
                        let value = r.read_text_value(&var)?;
                        arguments.push(ArgumentPayload { name, value });
                    }
                    Event::Empty(var) => {
                        let name = local_name(&var)?;
                        arguments.push(ArgumentPayload {
                            name,
                            value: String::new(),
                        });
                    }
                    Event::End(end) if end.name() == action_tag.name() => break,
                    _ => (),
                }
            }
        }

        Ok(Self {
            name,
            service_urn,
            arguments,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentPayload {
    pub name: String,
    pub value: String,
}

/// Reads `out` arguments from the response into the typed value
pub trait ScannableArguments: Sized {
    fn scan_arguments(scanner: &mut ArgumentScanner) -> Result<Self, ActionCallError>;
}

impl ScannableArguments for () {
    fn scan_arguments(_scanner: &mut ArgumentScanner) -> Result<Self, ActionCallError> {
        Ok(())
    }
}

/// Looks up response arguments by name. Unknown arguments are ignored
#[derive(Debug, Clone)]
pub struct ArgumentScanner {
    action_name: String,
    payload: Vec<ArgumentPayload>,
}

impl ArgumentScanner {
    pub fn new(action_name: impl Into<String>, payload: Vec<ArgumentPayload>) -> Self {
        Self {
            action_name: action_name.into(),
            payload,
        }
    }

    fn take(&mut self, name: &str) -> Result<ArgumentPayload, ActionCallError> {
        let position = self
            .payload
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| {
                ActionCallError::UnexpectedResponse(format!(
                    "{} response is missing {name} argument",
                    self.action_name
                ))
            })?;
        Ok(self.payload.remove(position))
    }

    pub fn next<T: IntoUpnpValue>(&mut self, name: &str) -> Result<T, ActionCallError> {
        let argument = self.take(name)?;
        T::from_xml_value(&argument.value).map_err(|e| {
            ActionCallError::UnexpectedResponse(format!(
                "{} argument {name}: {e:#}",
                self.action_name
            ))
        })
    }

    pub fn next_value(&mut self, name: &str, ty: ValueType) -> Result<Value, ActionCallError> {
        let argument = self.take(name)?;
        ty.parse(&argument.value).map_err(|e| {
            ActionCallError::UnexpectedResponse(format!(
                "{} argument {name}: {e:#}",
                self.action_name
            ))
        })
    }

    /// Arguments that were not consumed
    pub fn remaining(&self) -> &[ArgumentPayload] {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        action::{ActionRequest, ArgumentWriter, SoapMessage, WritableArguments},
        service_variables::Value,
    };

    use super::ActionPayload;

    #[test]
    fn parse_action_payload_xml() {
        let raw = br#"<?xml version="1.0"?>
<s:Envelope
xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"
s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
<s:Body>
<u:actionName xmlns:u="urn:schemas-upnp-org:service:serviceType:v">
<argumentName>in arg value</argumentName>
<anotherArgument>another &lt;value&gt;</anotherArgument>
<emptyArgument/>
<!-- other in args and their values go here, if any -->
</u:actionName>
</s:Body>
</s:Envelope>"#;
        let payload: SoapMessage<ActionPayload> = SoapMessage::from_xml(raw).unwrap();
        let payload = payload.into_inner();
        assert_eq!(payload.name, "actionName");
        assert_eq!(
            payload.service_urn.as_deref(),
            Some("urn:schemas-upnp-org:service:serviceType:v")
        );
        let args: Vec<_> = payload
            .arguments
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(
            args,
            [
                ("argumentName", "in arg value"),
                ("anotherArgument", "another <value>"),
                ("emptyArgument", ""),
            ]
        );
    }

    #[test]
    fn parse_empty_response_with_header() {
        let raw = br#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
<s:Header><token>abc</token></s:Header>
<s:Body><u:StopResponse xmlns:u="urn:schemas-upnp-org:service:AVTransport:1"/></s:Body>
</s:Envelope>"#;
        let payload = SoapMessage::<ActionPayload>::from_xml(raw)
            .unwrap()
            .into_inner();
        assert_eq!(payload.name, "StopResponse");
        assert!(payload.arguments.is_empty());
    }

    struct SetVolume {
        instance_id: u32,
        channel: String,
    }

    impl WritableArguments for SetVolume {
        fn write_arguments(&self, w: &mut ArgumentWriter<'_>) -> anyhow::Result<()> {
            w.write_argument("InstanceID", &self.instance_id)?;
            w.write_argument("Channel", &self.channel)?;
            w.write_value("DesiredVolume", &Value::U16(30))?;
            Ok(())
        }
    }

    #[test]
    fn write_request_envelope() {
        let arguments = SetVolume {
            instance_id: 0,
            channel: "Master".into(),
        };
        let request = ActionRequest {
            action_name: "SetVolume",
            service_urn: "urn:schemas-upnp-org:service:RenderingControl:1",
            arguments: &arguments,
        };
        let xml = SoapMessage::new(request).into_xml().unwrap();
        assert_eq!(
            xml,
            concat!(
                r#"<?xml version="1.0"?>"#,
                r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" "#,
                r#"s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
                r#"<s:Body>"#,
                r#"<u:SetVolume xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1">"#,
                r#"<InstanceID>0</InstanceID><Channel>Master</Channel>"#,
                r#"<DesiredVolume>30</DesiredVolume>"#,
                r#"</u:SetVolume></s:Body></s:Envelope>"#
            )
        );
    }
}
