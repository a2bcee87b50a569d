use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
};

use url::Url;

use crate::{
    action::{ArgumentDirection, ArgumentWriter, WritableArguments},
    eventing::{EventCache, EventedState},
    service::ServiceDescriptor,
    service_client::{ActionCallError, ActionCallResult, HttpTransport, ServiceClient},
    service_variables::{map_data_type, AllowedValueRange, DataType, Value, ValueType},
    templates::{
        service_description::{Scpd, ScpdVariable},
        SpecVersion,
    },
    urn::URN,
};

/// Generation time failure. Fatal to the service it was raised for
#[derive(Debug)]
pub enum SchemaError {
    /// Document is not a well formed SCPD
    Parse(anyhow::Error),
    UnresolvedStateVariable {
        action: String,
        argument: String,
        variable: String,
    },
    UnknownDataType {
        variable: String,
        data_type: String,
    },
    UnsupportedDataType {
        variable: String,
        data_type: DataType,
    },
    DuplicateStateVariable(String),
    DuplicateAction(String),
    /// Two schema names collapse into one identifier after case conversion
    DuplicateIdentifier {
        scope: String,
        identifier: String,
    },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::Parse(e) => write!(f, "Malformed service description: {e:#}"),
            SchemaError::UnresolvedStateVariable {
                action,
                argument,
                variable,
            } => write!(
                f,
                "Argument {argument} of {action} references unknown state variable {variable}"
            ),
            SchemaError::UnknownDataType {
                variable,
                data_type,
            } => write!(f, "State variable {variable} has unknown data type {data_type}"),
            SchemaError::UnsupportedDataType {
                variable,
                data_type,
            } => write!(
                f,
                "State variable {variable} has unsupported data type {data_type}"
            ),
            SchemaError::DuplicateStateVariable(name) => {
                write!(f, "State variable {name} is declared more than once")
            }
            SchemaError::DuplicateAction(name) => {
                write!(f, "Action {name} is declared more than once")
            }
            SchemaError::DuplicateIdentifier { scope, identifier } => {
                write!(f, "Identifier {identifier} is generated twice in {scope}")
            }
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchemaError::Parse(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Field of a request or response shape
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Argument name, used verbatim on the wire
    pub name: String,
    pub value_type: ValueType,
    pub related_state_variable: String,
    pub default_value: Option<String>,
    pub allowed_values: Vec<String>,
    pub allowed_range: Option<AllowedValueRange>,
}

/// Input of the operation.
///
/// `service_urn` is not declared by the schema, every invocation carries it as `xmlns:u`
#[derive(Debug, Clone, PartialEq)]
pub struct RequestShape {
    pub service_urn: URN,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseShape {
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Wire name of the action
    pub name: String,
    pub request: RequestShape,
    pub response: ResponseShape,
}

/// Named dynamic values in wire order
pub type DynamicArguments = Vec<(String, Value)>;

impl Operation {
    /// Value of the `SOAPAction` header
    pub fn soap_action(&self) -> String {
        format!("{}#{}", self.request.service_urn, self.name)
    }

    pub fn response_element(&self) -> String {
        format!("{}Response", self.name)
    }

    /// Build arguments from `name=value` text pairs, typed by the request shape
    pub fn arguments_from_text<'a>(
        &self,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> ActionCallResult<DynamicArguments> {
        let mut provided: HashMap<&str, &str> = HashMap::new();
        for (name, value) in pairs {
            if provided.insert(name, value).is_some() {
                return Err(ActionCallError::InvalidArguments(format!(
                    "{name} is provided twice"
                )));
            }
        }
        let mut arguments = Vec::with_capacity(self.request.fields.len());
        for field in &self.request.fields {
            let raw = provided
                .remove(field.name.as_str())
                .or(field.default_value.as_deref())
                .ok_or_else(|| {
                    ActionCallError::InvalidArguments(format!("missing {} argument", field.name))
                })?;
            let value = field.value_type.parse(raw).map_err(|e| {
                ActionCallError::InvalidArguments(format!("{}: {e:#}", field.name))
            })?;
            arguments.push((field.name.clone(), value));
        }
        if let Some(unknown) = provided.keys().next() {
            return Err(ActionCallError::InvalidArguments(format!(
                "{} does not take {unknown} argument",
                self.name
            )));
        }
        Ok(arguments)
    }

    /// Arguments must match request fields by name, order and type
    pub fn check_arguments(&self, arguments: &[(String, Value)]) -> ActionCallResult<()> {
        if arguments.len() != self.request.fields.len() {
            return Err(ActionCallError::InvalidArguments(format!(
                "{} takes {} arguments, got {}",
                self.name,
                self.request.fields.len(),
                arguments.len()
            )));
        }
        for (field, (name, value)) in self.request.fields.iter().zip(arguments) {
            if field.name != *name {
                return Err(ActionCallError::InvalidArguments(format!(
                    "expected {} argument, got {name}",
                    field.name
                )));
            }
            if field.value_type != value.value_type() {
                return Err(ActionCallError::InvalidArguments(format!(
                    "{name} must be {}, got {}",
                    field.value_type,
                    value.value_type()
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventedVariable {
    pub name: String,
    pub value_type: ValueType,
}

/// Everything a binding of one service consists of
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    pub descriptor: ServiceDescriptor,
    pub spec_version: SpecVersion,
    pub operations: Vec<Operation>,
    /// Evented state variables in document order
    pub evented: Vec<EventedVariable>,
}

impl ServiceDefinition {
    pub fn from_xml(descriptor: ServiceDescriptor, raw_xml: &[u8]) -> Result<Self, SchemaError> {
        let scpd = Scpd::from_xml(raw_xml)?;
        synthesize(descriptor, &scpd)
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|o| o.name == name)
    }

    pub fn is_evented(&self) -> bool {
        !self.evented.is_empty()
    }
}

fn field_from_variable(name: &str, variable: &ScpdVariable) -> Result<Field, SchemaError> {
    Ok(Field {
        name: name.to_owned(),
        value_type: map_data_type(&variable.name, &variable.data_type)?,
        related_state_variable: variable.name.clone(),
        default_value: variable.default_value.clone(),
        allowed_values: variable.allowed_values.clone(),
        allowed_range: variable.allowed_range.clone(),
    })
}

/// Derive the service binding from its parsed description.
///
/// Any failure aborts the whole service, no partial definition is produced.
pub fn synthesize(
    descriptor: ServiceDescriptor,
    scpd: &Scpd,
) -> Result<ServiceDefinition, SchemaError> {
    let mut variables = HashMap::with_capacity(scpd.variables.len());
    for variable in &scpd.variables {
        if variables.insert(variable.name.as_str(), variable).is_some() {
            return Err(SchemaError::DuplicateStateVariable(variable.name.clone()));
        }
    }

    let mut referenced = HashSet::new();
    let mut action_names = HashSet::new();
    let mut operations = Vec::with_capacity(scpd.actions.len());
    for action in &scpd.actions {
        if !action_names.insert(action.name.as_str()) {
            return Err(SchemaError::DuplicateAction(action.name.clone()));
        }
        let mut request = Vec::new();
        let mut response = Vec::new();
        for argument in &action.arguments {
            let variable = variables
                .get(argument.related_state_variable.as_str())
                .ok_or_else(|| SchemaError::UnresolvedStateVariable {
                    action: action.name.clone(),
                    argument: argument.name.clone(),
                    variable: argument.related_state_variable.clone(),
                })?;
            referenced.insert(variable.name.as_str());
            let field = field_from_variable(&argument.name, variable)?;
            match argument.direction {
                ArgumentDirection::In => request.push(field),
                ArgumentDirection::Out => response.push(field),
            }
        }
        operations.push(Operation {
            name: action.name.clone(),
            request: RequestShape {
                service_urn: descriptor.urn.clone(),
                fields: request,
            },
            response: ResponseShape { fields: response },
        });
    }

    let mut evented = Vec::new();
    for variable in &scpd.variables {
        if variable.send_events {
            evented.push(EventedVariable {
                name: variable.name.clone(),
                value_type: map_data_type(&variable.name, &variable.data_type)?,
            });
        } else if !referenced.contains(variable.name.as_str()) {
            if let Err(e) = map_data_type(&variable.name, &variable.data_type) {
                tracing::debug!("Ignoring unreferenced state variable: {e}");
            }
        }
    }

    tracing::debug!(
        "Synthesized {} with {} operations and {} evented variables",
        descriptor.name,
        operations.len(),
        evented.len()
    );

    Ok(ServiceDefinition {
        descriptor,
        spec_version: scpd.spec_version,
        operations,
        evented,
    })
}

struct DynamicRequest<'a>(&'a [(String, Value)]);

impl WritableArguments for DynamicRequest<'_> {
    fn write_arguments(&self, w: &mut ArgumentWriter<'_>) -> anyhow::Result<()> {
        for (name, value) in self.0 {
            w.write_value(name, value)?;
        }
        Ok(())
    }
}

/// Observed change of an evented variable
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub variable: String,
    pub value: Value,
}

/// Cache of evented variables typed by the service definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicState {
    tracked: Vec<EventedVariable>,
    values: HashMap<String, Value>,
}

impl DynamicState {
    pub fn new(tracked: Vec<EventedVariable>) -> Self {
        Self {
            tracked,
            values: HashMap::new(),
        }
    }

    /// `None` until the variable is observed
    pub fn get(&self, variable: &str) -> Option<&Value> {
        self.values.get(variable)
    }
}

impl EventedState for DynamicState {
    type Event = PropertyChange;

    fn apply(&mut self, variable: &str, value: &str) -> anyhow::Result<Option<PropertyChange>> {
        let Some(tracked) = self.tracked.iter().find(|v| v.name == variable) else {
            return Ok(None);
        };
        let value = tracked.value_type.parse(value)?;
        self.values.insert(variable.to_owned(), value.clone());
        Ok(Some(PropertyChange {
            variable: variable.to_owned(),
            value,
        }))
    }
}

/// Service definition bound to one device
#[derive(Debug)]
pub struct ServiceBinding {
    definition: ServiceDefinition,
    client: ServiceClient,
    events: EventCache<DynamicState>,
}

impl ServiceBinding {
    pub fn new(definition: ServiceDefinition, base_url: &Url) -> anyhow::Result<Self> {
        let client = ServiceClient::new(base_url, &definition.descriptor)?;
        let events = EventCache::new(DynamicState::new(definition.evented.clone()));
        Ok(Self {
            definition,
            client,
            events,
        })
    }

    pub fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    pub fn client(&self) -> &ServiceClient {
        &self.client
    }

    pub async fn invoke<T: HttpTransport>(
        &self,
        transport: &T,
        action: &str,
        arguments: &[(String, Value)],
    ) -> ActionCallResult<DynamicArguments> {
        let operation = self
            .definition
            .operation(action)
            .ok_or_else(|| ActionCallError::NotSupported(action.to_owned()))?;
        operation.check_arguments(arguments)?;
        let mut scanner = self
            .client
            .run_action_raw(transport, &operation.name, &DynamicRequest(arguments))
            .await?;
        let mut values = Vec::with_capacity(operation.response.fields.len());
        for field in &operation.response.fields {
            let value = scanner.next_value(&field.name, field.value_type)?;
            values.push((field.name.clone(), value));
        }
        for extra in scanner.remaining() {
            tracing::debug!("Ignoring undeclared {} argument {}", operation.name, extra.name);
        }
        Ok(values)
    }

    /// Fold property set into the cache. Untracked variables and malformed bodies are ignored
    pub fn parse_event(&self, raw: &[u8]) -> Vec<PropertyChange> {
        self.events.parse_event(raw)
    }

    pub fn cached(&self, variable: &str) -> Option<Value> {
        self.events.with_state(|state| state.get(variable).cloned())
    }

    pub fn cached_state(&self) -> DynamicState {
        self.events.snapshot()
    }
}
