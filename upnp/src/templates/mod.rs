use std::fmt::Display;

use anyhow::Context;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

use crate::{FromXml, XmlReaderExt};

pub mod service_description;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecVersion {
    pub major: usize,
    pub minor: usize,
}

impl SpecVersion {
    pub const fn upnp_v1() -> Self {
        Self { major: 1, minor: 0 }
    }
}

impl Display for SpecVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Reads `specVersion` contents, the opening tag must be already consumed
impl<'a> FromXml<'a> for SpecVersion {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self> {
        let mut major = None;
        let mut minor = None;
        loop {
            match r.read_event_err_eof()? {
                Event::Start(start) => match start.local_name().as_ref() {
                    b"major" => {
                        major = Some(r.read_text_value(&start)?.trim().parse::<usize>()?);
                    }
                    b"minor" => {
                        minor = Some(r.read_text_value(&start)?.trim().parse::<usize>()?);
                    }
                    _ => {
                        r.read_to_end(start.name())?;
                    }
                },
                Event::End(end) => {
                    anyhow::ensure!(
                        end.local_name().as_ref() == b"specVersion",
                        "expected end of specVersion, got {:?}",
                        end
                    );
                    break;
                }
                _ => {}
            }
        }
        Ok(Self {
            major: major.context("major version")?,
            minor: minor.context("minor version")?,
        })
    }
}
