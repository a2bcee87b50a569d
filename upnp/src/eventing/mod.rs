use std::sync::{Mutex, PoisonError};

use quick_xml::events::{BytesStart, BytesText, Event};

use crate::{local_name, FromXml, IntoXml, XmlReaderExt, XmlWriter};

pub const EVENT_NAMESPACE: &str = "urn:schemas-upnp-org:event-1-0";

/// One `<e:property>` child: variable name and its current value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub variable: String,
    pub value: String,
}

/// Body of a NOTIFY request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    pub properties: Vec<Property>,
}

impl PropertySet {
    pub fn from_xml(raw_xml: &[u8]) -> anyhow::Result<Self> {
        let mut r = quick_xml::Reader::from_reader(raw_xml);
        Self::read_xml(&mut r)
    }
}

impl<'a> FromXml<'a> for PropertySet {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self> {
        let (is_empty, root) = r.read_to_start_or_empty()?;
        anyhow::ensure!(
            root.local_name().as_ref() == b"propertyset",
            "expected propertyset, got {:?}",
            root
        );
        let mut properties = Vec::new();
        if is_empty {
            return Ok(Self { properties });
        }

        loop {
            match r.read_event_err_eof()? {
                Event::Start(property) if property.local_name().as_ref() == b"property" => loop {
                    match r.read_event_err_eof()? {
                        Event::Start(var) => {
                            let variable = local_name(&var)?;
                            let value = r.read_text_value(&var)?;
                            properties.push(Property { variable, value });
                        }
                        Event::Empty(var) => properties.push(Property {
                            variable: local_name(&var)?,
                            value: String::new(),
                        }),
                        Event::End(end) => {
                            anyhow::ensure!(end.local_name().as_ref() == b"property");
                            break;
                        }
                        _ => {}
                    }
                },
                Event::Start(other) => {
                    r.read_to_end(other.name())?;
                }
                Event::End(end) => {
                    anyhow::ensure!(end.local_name().as_ref() == b"propertyset");
                    break;
                }
                _ => {}
            }
        }
        Ok(Self { properties })
    }
}

impl IntoXml for PropertySet {
    fn write_xml(&self, w: &mut XmlWriter) -> anyhow::Result<()> {
        let root = BytesStart::new("e:propertyset").with_attributes([("xmlns:e", EVENT_NAMESPACE)]);
        let root_end = root.to_end().into_owned();
        w.write_event(Event::Start(root))?;
        for property in &self.properties {
            let wrapper = BytesStart::new("e:property");
            let wrapper_end = wrapper.to_end().into_owned();
            w.write_event(Event::Start(wrapper))?;
            let var = BytesStart::new(property.variable.as_str());
            let var_end = var.to_end().into_owned();
            w.write_event(Event::Start(var))?;
            w.write_event(Event::Text(BytesText::new(&property.value)))?;
            w.write_event(Event::End(var_end))?;
            w.write_event(Event::End(wrapper_end))?;
        }
        w.write_event(Event::End(root_end))?;
        Ok(())
    }
}

/// Cached values of the evented state variables of one service
pub trait EventedState {
    type Event;

    /// Update the cached field of `variable`.
    ///
    /// Returns `Ok(None)` for variables that are not tracked, error if the value can't be parsed.
    fn apply(&mut self, variable: &str, value: &str) -> anyhow::Result<Option<Self::Event>>;
}

/// Evented state shared between the notification receiver and readers.
///
/// Each notification is applied under one lock so concurrent notifications never interleave.
#[derive(Debug, Default)]
pub struct EventCache<S> {
    state: Mutex<S>,
}

impl<S: EventedState> EventCache<S> {
    pub fn new(state: S) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Fold raw notification body into the cache.
    ///
    /// Returns observed changes in document order. Malformed bodies are dropped.
    pub fn parse_event(&self, raw: &[u8]) -> Vec<S::Event> {
        let property_set = match PropertySet::from_xml(raw) {
            Ok(property_set) => property_set,
            Err(e) => {
                tracing::debug!("Dropping malformed property set: {e:#}");
                return Vec::new();
            }
        };
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut events = Vec::new();
        for Property { variable, value } in &property_set.properties {
            match state.apply(variable, value) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => tracing::trace!("Ignoring untracked variable {variable}"),
                Err(e) => tracing::warn!("Skipping evented variable {variable}: {e:#}"),
            }
        }
        events
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }
}

impl<S: EventedState + Clone> EventCache<S> {
    pub fn snapshot(&self) -> S {
        self.with_state(S::clone)
    }
}
