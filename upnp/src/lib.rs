#![doc = include_str!("../README.md")]
/// SOAP envelope shapes shared by every action invocation
pub mod action;
/// Binding synthesizer: derives the request/response shapes and event set of a service
pub mod binding;
/// Renders synthesized bindings as Rust source
pub mod codegen;
/// UPnP property change notifications
pub mod eventing;
pub mod service;
pub mod service_client;
pub mod service_variables;
/// Bindings produced by [codegen] for well known services
pub mod services;
pub mod templates;
pub mod urn;

pub use url::Url;

/// Useful unitily functions for [Reader](quick_xml::Reader)
pub trait XmlReaderExt<'a> {
    fn read_event_err_eof(&mut self) -> anyhow::Result<quick_xml::events::Event<'a>>;
    fn read_to_start(&mut self) -> anyhow::Result<quick_xml::events::BytesStart<'a>>;
    fn read_to_start_or_empty(
        &mut self,
    ) -> anyhow::Result<(bool, quick_xml::events::BytesStart<'a>)>;
    /// Read text content of the element that was just opened with `start`.
    /// Text is unescaped, CDATA sections are taken verbatim
    fn read_text_value(
        &mut self,
        start: &quick_xml::events::BytesStart<'_>,
    ) -> anyhow::Result<String>;
}

impl<'a> XmlReaderExt<'a> for quick_xml::Reader<&'a [u8]> {
    fn read_event_err_eof(&mut self) -> anyhow::Result<quick_xml::events::Event<'a>> {
        let event = self.read_event()?;
        match event {
            quick_xml::events::Event::Eof => Err(anyhow::anyhow!("early eof")),
            _ => Ok(event),
        }
    }

    fn read_to_start(&mut self) -> anyhow::Result<quick_xml::events::BytesStart<'a>> {
        loop {
            let event = self.read_event_err_eof()?;
            if let quick_xml::events::Event::Start(e) = event {
                break Ok(e);
            }
        }
    }

    fn read_to_start_or_empty(
        &mut self,
    ) -> anyhow::Result<(bool, quick_xml::events::BytesStart<'a>)> {
        loop {
            let event = self.read_event_err_eof()?;
            match event {
                quick_xml::events::Event::Start(e) => break Ok((false, e)),
                quick_xml::events::Event::Empty(e) => break Ok((true, e)),
                _ => (),
            }
        }
    }

    fn read_text_value(
        &mut self,
        start: &quick_xml::events::BytesStart<'_>,
    ) -> anyhow::Result<String> {
        let mut text = String::new();
        loop {
            match self.read_event_err_eof()? {
                quick_xml::events::Event::Text(t) => text.push_str(&t.unescape()?),
                quick_xml::events::Event::CData(c) => text.push_str(std::str::from_utf8(&c)?),
                quick_xml::events::Event::End(end) => {
                    anyhow::ensure!(
                        end.name() == start.name(),
                        "mismatched closing tag inside text value"
                    );
                    break Ok(text);
                }
                quick_xml::events::Event::Start(e) | quick_xml::events::Event::Empty(e) => {
                    anyhow::bail!(
                        "unexpected element {} inside text value",
                        String::from_utf8_lossy(e.name().as_ref())
                    )
                }
                _ => (),
            }
        }
    }
}

pub type XmlWriter = quick_xml::Writer<Vec<u8>>;

/// Allows structs to serialize themselves into xml fragments
pub trait IntoXml {
    fn write_xml(&self, w: &mut XmlWriter) -> anyhow::Result<()>;

    fn into_string(&self) -> anyhow::Result<String> {
        let mut w = quick_xml::Writer::new(Vec::new());
        self.write_xml(&mut w)?;
        Ok(String::from_utf8(w.into_inner())?)
    }
}

/// Allows structs to deserialize themselves from xml reader
pub trait FromXml<'a> {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self>
    where
        Self: Sized;
}

/// Name of the element without namespace prefix
pub(crate) fn local_name(start: &quick_xml::events::BytesStart<'_>) -> anyhow::Result<String> {
    Ok(std::str::from_utf8(start.local_name().as_ref())?.to_owned())
}
