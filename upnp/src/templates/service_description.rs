use std::str::FromStr;

use anyhow::Context;
use quick_xml::events::{BytesStart, Event};

use crate::{
    action::ArgumentDirection, binding::SchemaError, service_variables::AllowedValueRange,
    FromXml, XmlReaderExt,
};

use super::SpecVersion;

/// Parsed service control protocol description (SCPD)
#[derive(Debug, Clone, PartialEq)]
pub struct Scpd {
    pub spec_version: SpecVersion,
    pub variables: Vec<ScpdVariable>,
    pub actions: Vec<ScpdAction>,
}

impl Scpd {
    /// Parse raw SCPD document
    pub fn from_xml(raw_xml: &[u8]) -> Result<Self, SchemaError> {
        let mut r = quick_xml::Reader::from_reader(raw_xml);
        Self::read_xml(&mut r).map_err(SchemaError::Parse)
    }

    pub fn variable(&self, name: &str) -> Option<&ScpdVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn action(&self, name: &str) -> Option<&ScpdAction> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn evented_variables(&self) -> impl Iterator<Item = &ScpdVariable> {
        self.variables.iter().filter(|v| v.send_events)
    }
}

impl<'a> FromXml<'a> for Scpd {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self> {
        let root = r.read_to_start()?;
        anyhow::ensure!(
            root.local_name().as_ref() == b"scpd",
            "expected scpd root, got {:?}",
            root
        );

        let mut spec_version = None;
        let mut actions = Vec::new();
        let mut variables = Vec::new();

        loop {
            match r.read_event_err_eof()? {
                Event::Start(start) => match start.local_name().as_ref() {
                    b"specVersion" => spec_version = Some(SpecVersion::read_xml(r)?),
                    b"actionList" => loop {
                        match r.read_event_err_eof()? {
                            Event::Start(start) => {
                                anyhow::ensure!(
                                    start.local_name().as_ref() == b"action",
                                    "expected action, got {:?}",
                                    start
                                );
                                actions.push(ScpdAction::read_xml(r)?);
                            }
                            Event::End(end) => {
                                anyhow::ensure!(end.local_name().as_ref() == b"actionList");
                                break;
                            }
                            Event::Empty(empty) => {
                                anyhow::bail!("expected action, got empty {:?}", empty)
                            }
                            _ => {}
                        }
                    },
                    b"serviceStateTable" => loop {
                        match r.read_event_err_eof()? {
                            Event::Start(start) => {
                                anyhow::ensure!(
                                    start.local_name().as_ref() == b"stateVariable",
                                    "expected stateVariable, got {:?}",
                                    start
                                );
                                variables.push(ScpdVariable::read_xml(r, start)?);
                            }
                            Event::End(end) => {
                                anyhow::ensure!(
                                    end.local_name().as_ref() == b"serviceStateTable"
                                );
                                break;
                            }
                            Event::Empty(empty) => {
                                anyhow::bail!("expected stateVariable, got empty {:?}", empty)
                            }
                            _ => {}
                        }
                    },
                    _ => {
                        r.read_to_end(start.name())?;
                    }
                },
                Event::End(end) => {
                    anyhow::ensure!(end.local_name().as_ref() == b"scpd");
                    break;
                }
                // <actionList/> and friends
                _ => {}
            }
        }

        Ok(Self {
            spec_version: spec_version.context("specVersion")?,
            variables,
            actions,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScpdAction {
    pub name: String,
    pub arguments: Vec<ScpdActionArgument>,
}

impl ScpdAction {
    pub fn in_arguments(&self) -> impl Iterator<Item = &ScpdActionArgument> {
        self.arguments
            .iter()
            .filter(|a| a.direction == ArgumentDirection::In)
    }

    pub fn out_arguments(&self) -> impl Iterator<Item = &ScpdActionArgument> {
        self.arguments
            .iter()
            .filter(|a| a.direction == ArgumentDirection::Out)
    }
}

impl<'a> FromXml<'a> for ScpdAction {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self> {
        let mut name = None;
        let mut arguments = Vec::new();
        loop {
            match r.read_event_err_eof()? {
                Event::Start(start) => match start.local_name().as_ref() {
                    b"name" => name = Some(r.read_text_value(&start)?.trim().to_owned()),
                    b"argumentList" => loop {
                        match r.read_event_err_eof()? {
                            Event::Start(start) => {
                                anyhow::ensure!(
                                    start.local_name().as_ref() == b"argument",
                                    "expected argument, got {:?}",
                                    start
                                );
                                arguments.push(ScpdActionArgument::read_xml(r)?);
                            }
                            Event::End(end) => {
                                anyhow::ensure!(end.local_name().as_ref() == b"argumentList");
                                break;
                            }
                            Event::Empty(empty) => {
                                anyhow::bail!("expected argument, got empty {:?}", empty)
                            }
                            _ => {}
                        }
                    },
                    _ => {
                        r.read_to_end(start.name())?;
                    }
                },
                Event::End(end) => {
                    anyhow::ensure!(end.local_name().as_ref() == b"action");
                    break;
                }
                _ => {}
            }
        }
        let name = name.context("action name")?;

        Ok(Self { name, arguments })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScpdActionArgument {
    pub name: String,
    pub direction: ArgumentDirection,
    pub related_state_variable: String,
}

impl<'a> FromXml<'a> for ScpdActionArgument {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self> {
        let mut name = None;
        let mut direction = None;
        let mut related_state_variable = None;
        loop {
            match r.read_event_err_eof()? {
                Event::Start(start) => match start.local_name().as_ref() {
                    b"name" => {
                        name = Some(r.read_text_value(&start)?.trim().to_owned());
                    }
                    b"direction" => {
                        let text = r.read_text_value(&start)?;
                        direction = Some(ArgumentDirection::from_str(text.trim())?);
                    }
                    b"relatedStateVariable" => {
                        related_state_variable = Some(r.read_text_value(&start)?.trim().to_owned());
                    }
                    _ => {
                        r.read_to_end(start.name())?;
                    }
                },
                Event::End(end) => {
                    anyhow::ensure!(end.local_name().as_ref() == b"argument");
                    break;
                }
                // <retval/>
                _ => {}
            }
        }

        let name = name.context("argument name")?;
        let direction = direction.with_context(|| format!("direction of {name}"))?;
        let related_state_variable = related_state_variable
            .with_context(|| format!("related state variable of {name}"))?;

        Ok(Self {
            name,
            direction,
            related_state_variable,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScpdVariable {
    pub send_events: bool,
    pub multicast: bool,
    pub name: String,
    /// Declared type name, mapped only during synthesis
    pub data_type: String,
    pub default_value: Option<String>,
    pub allowed_range: Option<AllowedValueRange>,
    pub allowed_values: Vec<String>,
}

fn yes_no_attribute(start: &BytesStart<'_>, attribute: &[u8]) -> bool {
    start
        .attributes()
        .flatten()
        .find_map(|a| {
            (a.key.local_name().as_ref() == attribute).then(|| a.value.as_ref() == b"yes")
        })
        .unwrap_or(false)
}

impl ScpdVariable {
    /// Reads `stateVariable` contents. Attributes are taken from its opening tag
    pub fn read_xml(
        r: &mut quick_xml::Reader<&[u8]>,
        start: BytesStart<'_>,
    ) -> anyhow::Result<Self> {
        let mut name = None;
        let mut data_type = None;
        let mut default_value = None;
        let mut allowed_range = None;
        let mut allowed_values = Vec::new();

        loop {
            match r.read_event_err_eof()? {
                Event::Start(start) => match start.local_name().as_ref() {
                    b"name" => name = Some(r.read_text_value(&start)?.trim().to_owned()),
                    b"dataType" => {
                        data_type = Some(r.read_text_value(&start)?.trim().to_owned());
                    }
                    b"defaultValue" => default_value = Some(r.read_text_value(&start)?),
                    b"allowedValueRange" => allowed_range = Some(read_allowed_range(r)?),
                    b"allowedValueList" => loop {
                        match r.read_event_err_eof()? {
                            Event::Start(start) => {
                                anyhow::ensure!(
                                    start.local_name().as_ref() == b"allowedValue",
                                    "expected allowedValue, got {:?}",
                                    start
                                );
                                allowed_values.push(r.read_text_value(&start)?);
                            }
                            Event::Empty(empty)
                                if empty.local_name().as_ref() == b"allowedValue" =>
                            {
                                allowed_values.push(String::new());
                            }
                            Event::End(end) => {
                                anyhow::ensure!(
                                    end.local_name().as_ref() == b"allowedValueList"
                                );
                                break;
                            }
                            _ => {}
                        }
                    },
                    _ => {
                        r.read_to_end(start.name())?;
                    }
                },
                Event::End(end) => {
                    anyhow::ensure!(end.local_name().as_ref() == b"stateVariable");
                    break;
                }
                _ => {}
            }
        }
        let name = name.context("state variable name")?;
        let data_type = data_type.with_context(|| format!("data type of {name}"))?;

        Ok(Self {
            send_events: yes_no_attribute(&start, b"sendEvents"),
            multicast: yes_no_attribute(&start, b"multicast"),
            name,
            data_type,
            default_value,
            allowed_range,
            allowed_values,
        })
    }
}

fn read_allowed_range(r: &mut quick_xml::Reader<&[u8]>) -> anyhow::Result<AllowedValueRange> {
    let mut minimum = None;
    let mut maximum = None;
    let mut step = None;
    loop {
        match r.read_event_err_eof()? {
            Event::Start(start) => match start.local_name().as_ref() {
                b"minimum" => minimum = Some(r.read_text_value(&start)?.trim().to_owned()),
                b"maximum" => maximum = Some(r.read_text_value(&start)?.trim().to_owned()),
                b"step" => step = Some(r.read_text_value(&start)?.trim().to_owned()),
                _ => {
                    r.read_to_end(start.name())?;
                }
            },
            Event::End(end) => {
                anyhow::ensure!(end.local_name().as_ref() == b"allowedValueRange");
                break;
            }
            _ => {}
        }
    }
    Ok(AllowedValueRange {
        minimum: minimum.context("range minimum")?,
        maximum: maximum.context("range maximum")?,
        step,
    })
}
