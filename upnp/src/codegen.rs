use std::{
    collections::HashSet,
    fmt::{Display, Write},
};

use crate::{
    binding::{EventedVariable, Field, Operation, SchemaError, ServiceDefinition},
    service_variables::ValueType,
};

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "try", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv",
    "typeof", "unsized", "virtual", "yield",
];

/// Keywords that can't be raw identifiers
const RESERVED: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Names every generated module brings into scope
const IMPORTED_TYPES: &[&str] = &[
    "ActionCallError",
    "ActionCallResult",
    "ArgumentScanner",
    "ArgumentWriter",
    "EventCache",
    "EventedState",
    "HttpTransport",
    "IntoUpnpValue",
    "ScannableArguments",
    "ServiceClient",
    "ServiceDescriptor",
    "UpnpUri",
    "URN",
    "UrnKind",
    "Url",
    "WritableArguments",
];

/// Methods of the generated service struct that actions can't take
const SERVICE_METHODS: &[&str] = &["new", "descriptor", "client", "parse_event", "state"];

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Path the generated module reaches the runtime through
    pub runtime: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            runtime: "upnp".to_owned(),
        }
    }
}

fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // `IDs` stays one word
            let plural = chars.get(i + 1) == Some(&'s')
                && chars.get(i + 2).map_or(true, |n| !n.is_lowercase());
            let next_is_lower = next_is_lower && !plural;
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn identifier(raw: String) -> String {
    if raw.is_empty() {
        return "unnamed".to_owned();
    }
    if raw.starts_with(|c: char| c.is_numeric()) {
        return format!("_{raw}");
    }
    if RESERVED.contains(&raw.as_str()) {
        return format!("{raw}_");
    }
    if KEYWORDS.contains(&raw.as_str()) {
        return format!("r#{raw}");
    }
    raw
}

/// `InstanceID` -> `instance_id`
pub fn snake_case(name: &str) -> String {
    let words: Vec<String> = split_words(name)
        .into_iter()
        .map(|w| w.to_lowercase())
        .collect();
    identifier(words.join("_"))
}

/// `A_ARG_TYPE_InstanceID` -> `AArgTypeInstanceId`
pub fn pascal_case(name: &str) -> String {
    let mut out = String::new();
    for word in split_words(name) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    identifier(out)
}

/// File stem of the generated module
pub fn module_name(definition: &ServiceDefinition) -> String {
    snake_case(&definition.descriptor.name)
        .trim_start_matches("r#")
        .to_owned()
}

fn is_copy(value_type: ValueType) -> bool {
    !matches!(value_type, ValueType::Text | ValueType::Uri)
}

struct Scope {
    name: String,
    taken: HashSet<String>,
}

impl Scope {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            taken: HashSet::new(),
        }
    }

    fn with_taken(name: impl Into<String>, taken: &[&str]) -> Self {
        let mut scope = Self::new(name);
        scope.taken.extend(taken.iter().map(|t| t.to_string()));
        scope
    }

    fn claim(&mut self, identifier: String) -> Result<String, SchemaError> {
        if self.taken.insert(identifier.clone()) {
            Ok(identifier)
        } else {
            Err(SchemaError::DuplicateIdentifier {
                scope: self.name.clone(),
                identifier,
            })
        }
    }
}

struct FieldPlan<'a> {
    ident: String,
    field: &'a Field,
}

fn plan_fields<'a>(scope: &str, fields: &'a [Field]) -> Result<Vec<FieldPlan<'a>>, SchemaError> {
    let mut scope = Scope::new(scope);
    fields
        .iter()
        .map(|field| {
            Ok(FieldPlan {
                ident: scope.claim(snake_case(&field.name))?,
                field,
            })
        })
        .collect()
}

struct OperationPlan<'a> {
    method: String,
    request_type: String,
    response_type: String,
    request: Vec<FieldPlan<'a>>,
    response: Vec<FieldPlan<'a>>,
    operation: &'a Operation,
}

struct EventPlan<'a> {
    field: String,
    variant: String,
    variable: &'a EventedVariable,
}

/// Validated naming of one service module, ready to be written out
pub struct RenderedService<'a> {
    definition: &'a ServiceDefinition,
    runtime: &'a str,
    service_type: String,
    state_type: String,
    event_type: String,
    operations: Vec<OperationPlan<'a>>,
    events: Vec<EventPlan<'a>>,
}

impl<'a> RenderedService<'a> {
    pub fn new(
        definition: &'a ServiceDefinition,
        options: &'a RenderOptions,
    ) -> Result<Self, SchemaError> {
        let module = &definition.descriptor.name;
        let mut types = Scope::with_taken(module.as_str(), IMPORTED_TYPES);
        let mut methods = Scope::with_taken(format!("{module} methods"), SERVICE_METHODS);

        let service_type = types.claim(pascal_case(module))?;
        let (state_type, event_type) = if definition.is_evented() {
            (
                types.claim(format!("{service_type}State"))?,
                types.claim(format!("{service_type}Event"))?,
            )
        } else {
            (format!("{service_type}State"), format!("{service_type}Event"))
        };

        let mut operations = Vec::with_capacity(definition.operations.len());
        for operation in &definition.operations {
            let base = pascal_case(&operation.name);
            let request_type = types.claim(format!("{base}Request"))?;
            let response_type = types.claim(format!("{base}Response"))?;
            operations.push(OperationPlan {
                method: methods.claim(snake_case(&operation.name))?,
                request: plan_fields(&request_type, &operation.request.fields)?,
                response: plan_fields(&response_type, &operation.response.fields)?,
                request_type,
                response_type,
                operation,
            });
        }

        let mut fields = Scope::new(state_type.as_str());
        let mut variants = Scope::new(event_type.as_str());
        let mut events = Vec::with_capacity(definition.evented.len());
        for variable in &definition.evented {
            events.push(EventPlan {
                field: fields.claim(snake_case(&variable.name))?,
                variant: variants.claim(pascal_case(&variable.name))?,
                variable,
            });
        }

        Ok(Self {
            definition,
            runtime: &options.runtime,
            service_type,
            state_type,
            event_type,
            operations,
            events,
        })
    }

    fn uses_uri(&self) -> bool {
        let in_fields = self.operations.iter().any(|op| {
            op.request
                .iter()
                .chain(&op.response)
                .any(|f| f.field.value_type == ValueType::Uri)
        });
        in_fields || self.events.iter().any(|e| e.variable.value_type == ValueType::Uri)
    }

    fn write_header(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let has_actions = !self.operations.is_empty();
        let evented = !self.events.is_empty();
        writeln!(f, "//! `{}` service binding.", self.definition.descriptor.name)?;
        writeln!(f, "//!")?;
        writeln!(
            f,
            "//! Generated from the service description by `upnp-bindgen`, do not edit."
        )?;
        writeln!(f)?;
        writeln!(f, "use {}::{{", self.runtime)?;
        if has_actions {
            writeln!(
                f,
                "    action::{{ArgumentScanner, ArgumentWriter, ScannableArguments, WritableArguments}},"
            )?;
        }
        if evented {
            writeln!(f, "    eventing::{{EventCache, EventedState}},")?;
        }
        writeln!(f, "    service::ServiceDescriptor,")?;
        if has_actions {
            writeln!(
                f,
                "    service_client::{{ActionCallError, ActionCallResult, HttpTransport, ServiceClient}},"
            )?;
        } else {
            writeln!(f, "    service_client::{{HttpTransport, ServiceClient}},")?;
        }
        match (evented, self.uses_uri()) {
            (true, true) => writeln!(f, "    service_variables::{{IntoUpnpValue, UpnpUri}},")?,
            (true, false) => writeln!(f, "    service_variables::IntoUpnpValue,")?,
            (false, true) => writeln!(f, "    service_variables::UpnpUri,")?,
            (false, false) => {}
        }
        writeln!(f, "    urn::{{UrnKind, URN}},")?;
        writeln!(f, "    Url,")?;
        writeln!(f, "}};")
    }

    fn write_fields(f: &mut std::fmt::Formatter<'_>, fields: &[FieldPlan<'_>]) -> std::fmt::Result {
        for plan in fields {
            writeln!(f, "    /// {}", field_doc(plan.field))?;
            writeln!(
                f,
                "    pub {}: {},",
                plan.ident,
                plan.field.value_type.rust_type()
            )?;
        }
        Ok(())
    }

    fn write_request(&self, f: &mut std::fmt::Formatter<'_>, op: &OperationPlan<'_>) -> std::fmt::Result {
        let name = &op.request_type;
        writeln!(f)?;
        writeln!(f, "/// Input arguments of `{}`", op.operation.name)?;
        if op.request.is_empty() {
            writeln!(f, "#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]")?;
            writeln!(f, "pub struct {name};")?;
            writeln!(f)?;
            writeln!(f, "impl WritableArguments for {name} {{")?;
            writeln!(
                f,
                "    fn write_arguments(&self, _w: &mut ArgumentWriter<'_>) -> anyhow::Result<()> {{"
            )?;
            writeln!(f, "        Ok(())")?;
            writeln!(f, "    }}")?;
            return writeln!(f, "}}");
        }
        writeln!(f, "#[derive(Debug, Clone, PartialEq)]")?;
        writeln!(f, "pub struct {name} {{")?;
        Self::write_fields(f, &op.request)?;
        writeln!(f, "}}")?;
        writeln!(f)?;
        writeln!(f, "impl WritableArguments for {name} {{")?;
        writeln!(
            f,
            "    fn write_arguments(&self, w: &mut ArgumentWriter<'_>) -> anyhow::Result<()> {{"
        )?;
        for plan in &op.request {
            writeln!(
                f,
                "        w.write_argument({:?}, &self.{})?;",
                plan.field.name, plan.ident
            )?;
        }
        writeln!(f, "        Ok(())")?;
        writeln!(f, "    }}")?;
        writeln!(f, "}}")
    }

    fn write_response(&self, f: &mut std::fmt::Formatter<'_>, op: &OperationPlan<'_>) -> std::fmt::Result {
        let name = &op.response_type;
        writeln!(f)?;
        writeln!(f, "/// Output arguments of `{}`", op.operation.name)?;
        if op.response.is_empty() {
            writeln!(f, "#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]")?;
            writeln!(f, "pub struct {name};")?;
            writeln!(f)?;
            writeln!(f, "impl ScannableArguments for {name} {{")?;
            writeln!(
                f,
                "    fn scan_arguments(_scanner: &mut ArgumentScanner) -> Result<Self, ActionCallError> {{"
            )?;
            writeln!(f, "        Ok(Self)")?;
            writeln!(f, "    }}")?;
            return writeln!(f, "}}");
        }
        writeln!(f, "#[derive(Debug, Clone, PartialEq)]")?;
        writeln!(f, "pub struct {name} {{")?;
        Self::write_fields(f, &op.response)?;
        writeln!(f, "}}")?;
        writeln!(f)?;
        writeln!(f, "impl ScannableArguments for {name} {{")?;
        writeln!(
            f,
            "    fn scan_arguments(scanner: &mut ArgumentScanner) -> Result<Self, ActionCallError> {{"
        )?;
        writeln!(f, "        Ok(Self {{")?;
        for plan in &op.response {
            writeln!(
                f,
                "            {}: scanner.next({:?})?,",
                plan.ident, plan.field.name
            )?;
        }
        writeln!(f, "        }})")?;
        writeln!(f, "    }}")?;
        writeln!(f, "}}")
    }

    fn write_events(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = &self.state_type;
        let event = &self.event_type;
        writeln!(f)?;
        writeln!(f, "/// Last observed values of the evented state variables")?;
        writeln!(f, "#[derive(Debug, Clone, Default, PartialEq)]")?;
        writeln!(f, "pub struct {state} {{")?;
        for plan in &self.events {
            writeln!(f, "    /// `{}`", plan.variable.name)?;
            writeln!(
                f,
                "    pub {}: Option<{}>,",
                plan.field,
                plan.variable.value_type.rust_type()
            )?;
        }
        writeln!(f, "}}")?;
        writeln!(f)?;
        writeln!(f, "#[derive(Debug, Clone, PartialEq)]")?;
        writeln!(f, "pub enum {event} {{")?;
        for plan in &self.events {
            writeln!(
                f,
                "    {}({}),",
                plan.variant,
                plan.variable.value_type.rust_type()
            )?;
        }
        writeln!(f, "}}")?;
        writeln!(f)?;
        writeln!(f, "impl EventedState for {state} {{")?;
        writeln!(f, "    type Event = {event};")?;
        writeln!(f)?;
        writeln!(
            f,
            "    fn apply(&mut self, variable: &str, value: &str) -> anyhow::Result<Option<Self::Event>> {{"
        )?;
        writeln!(f, "        let event = match variable {{")?;
        for plan in &self.events {
            let ty = plan.variable.value_type;
            writeln!(f, "            {:?} => {{", plan.variable.name)?;
            writeln!(
                f,
                "                let value = {}::from_xml_value(value)?;",
                ty.rust_type()
            )?;
            if is_copy(ty) {
                writeln!(f, "                self.{} = Some(value);", plan.field)?;
            } else {
                writeln!(f, "                self.{} = Some(value.clone());", plan.field)?;
            }
            writeln!(f, "                {event}::{}(value)", plan.variant)?;
            writeln!(f, "            }}")?;
        }
        writeln!(f, "            _ => return Ok(None),")?;
        writeln!(f, "        }};")?;
        writeln!(f, "        Ok(Some(event))")?;
        writeln!(f, "    }}")?;
        writeln!(f, "}}")
    }

    fn write_service(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let descriptor = &self.definition.descriptor;
        let service = &self.service_type;
        let evented = !self.events.is_empty();
        writeln!(f)?;
        writeln!(f, "/// Client of `{}`", descriptor.urn)?;
        writeln!(f, "#[derive(Debug)]")?;
        writeln!(f, "pub struct {service}<T> {{")?;
        writeln!(f, "    client: ServiceClient,")?;
        writeln!(f, "    transport: T,")?;
        if evented {
            writeln!(f, "    events: EventCache<{}>,", self.state_type)?;
        }
        writeln!(f, "}}")?;
        writeln!(f)?;
        writeln!(f, "impl<T: HttpTransport> {service}<T> {{")?;
        writeln!(f, "    pub fn descriptor() -> ServiceDescriptor {{")?;
        writeln!(f, "        ServiceDescriptor {{")?;
        writeln!(f, "            name: {:?}.to_owned(),", descriptor.name)?;
        writeln!(f, "            urn: URN {{")?;
        writeln!(f, "                domain: {:?}.to_owned(),", descriptor.urn.domain)?;
        writeln!(f, "                kind: UrnKind::{:?},", descriptor.urn.kind)?;
        writeln!(f, "                name: {:?}.to_owned(),", descriptor.urn.name)?;
        writeln!(f, "                version: {},", descriptor.urn.version)?;
        writeln!(f, "            }},")?;
        writeln!(f, "            control_path: {:?}.to_owned(),", descriptor.control_path)?;
        writeln!(f, "            event_path: {:?}.to_owned(),", descriptor.event_path)?;
        writeln!(f, "        }}")?;
        writeln!(f, "    }}")?;
        writeln!(f)?;
        writeln!(f, "    /// Resolve service endpoints against the device base url")?;
        writeln!(
            f,
            "    pub fn new(transport: T, base_url: &Url) -> anyhow::Result<Self> {{"
        )?;
        writeln!(
            f,
            "        let client = ServiceClient::new(base_url, &Self::descriptor())?;"
        )?;
        writeln!(f, "        Ok(Self {{")?;
        writeln!(f, "            client,")?;
        writeln!(f, "            transport,")?;
        if evented {
            writeln!(
                f,
                "            events: EventCache::new({}::default()),",
                self.state_type
            )?;
        }
        writeln!(f, "        }})")?;
        writeln!(f, "    }}")?;
        writeln!(f)?;
        writeln!(f, "    pub fn client(&self) -> &ServiceClient {{")?;
        writeln!(f, "        &self.client")?;
        writeln!(f, "    }}")?;

        for op in &self.operations {
            writeln!(f)?;
            let (params, argument) = if op.request.is_empty() {
                (String::new(), format!("&{}", op.request_type))
            } else {
                (format!(", request: &{}", op.request_type), "request".to_owned())
            };
            writeln!(
                f,
                "    pub async fn {}(&self{params}) -> ActionCallResult<{}> {{",
                op.method, op.response_type
            )?;
            writeln!(f, "        self.client")?;
            writeln!(
                f,
                "            .run_action(&self.transport, {:?}, {argument})",
                op.operation.name
            )?;
            writeln!(f, "            .await")?;
            writeln!(f, "    }}")?;
        }

        if evented {
            writeln!(f)?;
            writeln!(
                f,
                "    /// Fold property change notification into the cached state"
            )?;
            writeln!(
                f,
                "    pub fn parse_event(&self, raw: &[u8]) -> Vec<{}> {{",
                self.event_type
            )?;
            writeln!(f, "        self.events.parse_event(raw)")?;
            writeln!(f, "    }}")?;
            writeln!(f)?;
            writeln!(f, "    pub fn state(&self) -> {} {{", self.state_type)?;
            writeln!(f, "        self.events.snapshot()")?;
            writeln!(f, "    }}")?;
        }
        writeln!(f, "}}")
    }
}

impl Display for RenderedService<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_header(f)?;
        for op in &self.operations {
            self.write_request(f, op)?;
            self.write_response(f, op)?;
        }
        if !self.events.is_empty() {
            self.write_events(f)?;
        }
        self.write_service(f)
    }
}

fn field_doc(field: &Field) -> String {
    let mut doc = format!("`{}`", field.related_state_variable);
    if !field.allowed_values.is_empty() {
        doc.push_str(", one of ");
        for (i, value) in field.allowed_values.iter().enumerate() {
            if i > 0 {
                doc.push_str(", ");
            }
            let _ = write!(doc, "`{value}`");
        }
    }
    if let Some(range) = &field.allowed_range {
        let _ = write!(doc, ", range `{range}`");
    }
    if let Some(default) = &field.default_value {
        let _ = write!(doc, ", defaults to `{default}`");
    }
    doc.replace(['\r', '\n'], " ")
}

/// Render the definition as a Rust module using the `upnp` runtime
pub fn render(definition: &ServiceDefinition) -> Result<String, SchemaError> {
    render_with(definition, &RenderOptions::default())
}

pub fn render_with(
    definition: &ServiceDefinition,
    options: &RenderOptions,
) -> Result<String, SchemaError> {
    let rendered = RenderedService::new(definition, options)?;
    Ok(rendered.to_string())
}

#[cfg(test)]
mod tests {
    use crate::{
        binding::{SchemaError, ServiceDefinition},
        service::{KnownService, ServiceDescriptor},
        urn::URN,
    };

    use super::{module_name, pascal_case, render, snake_case};

    const RENDERING_CONTROL: &[u8] = include_bytes!("../fixtures/RenderingControl.xml");
    const CONNECTION_MANAGER: &[u8] = include_bytes!("../fixtures/ConnectionManager.xml");

    #[test]
    fn case_conversion() {
        assert_eq!(snake_case("InstanceID"), "instance_id");
        assert_eq!(snake_case("A_ARG_TYPE_InstanceID"), "a_arg_type_instance_id");
        assert_eq!(snake_case("CurrentURIMetaData"), "current_uri_meta_data");
        assert_eq!(snake_case("Track2Name"), "track2_name");
        assert_eq!(snake_case("GetCurrentConnectionIDs"), "get_current_connection_ids");
        assert_eq!(snake_case("Type"), "r#type");
        assert_eq!(snake_case("Self"), "self_");
        assert_eq!(snake_case("3DMode"), "_3_d_mode");
        assert_eq!(pascal_case("A_ARG_TYPE_InstanceID"), "AArgTypeInstanceId");
        assert_eq!(pascal_case("GetVolume"), "GetVolume");
        assert_eq!(pascal_case("LastChange"), "LastChange");
    }

    #[test]
    fn render_rendering_control() {
        let definition = ServiceDefinition::from_xml(
            KnownService::RenderingControl.descriptor(),
            RENDERING_CONTROL,
        )
        .unwrap();
        assert_eq!(module_name(&definition), "rendering_control");
        let source = render(&definition).unwrap();

        assert!(source.starts_with("//! `RenderingControl` service binding."));
        assert!(source.contains("use upnp::{"));
        assert!(source.contains("pub struct SetVolumeRequest {"));
        assert!(source.contains("    pub desired_volume: u16,"));
        assert!(source.contains("    /// `Volume`, range `0..=100 step 1`"));
        assert!(source.contains("    /// `A_ARG_TYPE_Channel`, one of `Master`, `LF`, `RF`"));
        assert!(source.contains(r#"        w.write_argument("DesiredVolume", &self.desired_volume)?;"#));
        assert!(source.contains("pub struct SetVolumeResponse;"));
        assert!(source.contains(r#"            current_volume: scanner.next("CurrentVolume")?,"#));
        assert!(source.contains("pub struct RenderingControl<T> {"));
        assert!(source.contains(
            "    pub async fn get_volume(&self, request: &GetVolumeRequest) -> ActionCallResult<GetVolumeResponse> {"
        ));
        assert!(source.contains(r#"            .run_action(&self.transport, "GetVolume", request)"#));
        assert!(source.contains("pub struct RenderingControlState {"));
        assert!(source.contains("    pub last_change: Option<String>,"));
        assert!(source.contains("    LastChange(String),"));
        assert!(source.contains(r#"            control_path: "/MediaRenderer/RenderingControl/Control".to_owned(),"#));
        assert!(!source.contains("UpnpUri"));
    }

    #[test]
    fn render_without_events() {
        let raw = br#"<scpd><specVersion><major>1</major><minor>0</minor></specVersion>
<actionList><action><name>Reset</name></action></actionList>
<serviceStateTable><stateVariable><name>Art</name><dataType>uri</dataType></stateVariable>
</serviceStateTable></scpd>"#;
        let definition = ServiceDefinition::from_xml(
            ServiceDescriptor::unscoped(URN::service("Plain", 1)),
            raw,
        )
        .unwrap();
        let source = render(&definition).unwrap();
        assert!(!source.contains("EventCache"));
        assert!(!source.contains("IntoUpnpValue"));
        assert!(source.contains("pub struct ResetRequest;"));
        assert!(source.contains("    pub async fn reset(&self) -> ActionCallResult<ResetResponse> {"));
        assert!(source.contains(r#"            .run_action(&self.transport, "Reset", &ResetRequest)"#));
    }

    #[test]
    fn evented_numeric_state() {
        let definition = ServiceDefinition::from_xml(
            KnownService::ConnectionManager.descriptor(),
            CONNECTION_MANAGER,
        )
        .unwrap();
        let source = render(&definition).unwrap();
        assert!(source.contains("    pub current_connection_ids: Option<String>,"));
        assert!(source.contains("    pub connection_id: i32,"));
    }

    #[test]
    fn colliding_identifiers() {
        let raw = br#"<scpd><specVersion><major>1</major><minor>0</minor></specVersion>
<actionList><action><name>GetInfo</name><argumentList>
<argument><name>InstanceID</name><direction>in</direction><relatedStateVariable>A</relatedStateVariable></argument>
<argument><name>Instance_ID</name><direction>in</direction><relatedStateVariable>A</relatedStateVariable></argument>
</argumentList></action></actionList>
<serviceStateTable><stateVariable><name>A</name><dataType>ui4</dataType></stateVariable>
</serviceStateTable></scpd>"#;
        let definition = ServiceDefinition::from_xml(
            ServiceDescriptor::unscoped(URN::service("Info", 1)),
            raw,
        )
        .unwrap();
        match render(&definition) {
            Err(SchemaError::DuplicateIdentifier { scope, identifier }) => {
                assert_eq!(scope, "GetInfoRequest");
                assert_eq!(identifier, "instance_id");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let raw = br#"<scpd><specVersion><major>1</major><minor>0</minor></specVersion>
<actionList><action><name>New</name></action></actionList></scpd>"#;
        let definition = ServiceDefinition::from_xml(
            ServiceDescriptor::unscoped(URN::service("Factory", 1)),
            raw,
        )
        .unwrap();
        assert!(matches!(
            render(&definition),
            Err(SchemaError::DuplicateIdentifier { .. })
        ));
    }
}
