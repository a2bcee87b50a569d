//! `RenderingControl` service binding.
//!
//! Generated from the service description by `upnp-bindgen`, do not edit.

use crate::{
    action::{ArgumentScanner, ArgumentWriter, ScannableArguments, WritableArguments},
    eventing::{EventCache, EventedState},
    service::ServiceDescriptor,
    service_client::{ActionCallError, ActionCallResult, HttpTransport, ServiceClient},
    service_variables::IntoUpnpValue,
    urn::{UrnKind, URN},
    Url,
};

/// Input arguments of `ListPresets`
#[derive(Debug, Clone, PartialEq)]
pub struct ListPresetsRequest {
    /// `A_ARG_TYPE_InstanceID`
    pub instance_id: u32,
}

impl WritableArguments for ListPresetsRequest {
    fn write_arguments(&self, w: &mut ArgumentWriter<'_>) -> anyhow::Result<()> {
        w.write_argument("InstanceID", &self.instance_id)?;
        Ok(())
    }
}

/// Output arguments of `ListPresets`
#[derive(Debug, Clone, PartialEq)]
pub struct ListPresetsResponse {
    /// `PresetNameList`
    pub current_preset_name_list: String,
}

impl ScannableArguments for ListPresetsResponse {
    fn scan_arguments(scanner: &mut ArgumentScanner) -> Result<Self, ActionCallError> {
        Ok(Self {
            current_preset_name_list: scanner.next("CurrentPresetNameList")?,
        })
    }
}

/// Input arguments of `SelectPreset`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectPresetRequest {
    /// `A_ARG_TYPE_InstanceID`
    pub instance_id: u32,
    /// `A_ARG_TYPE_PresetName`, one of `FactoryDefaults`
    pub preset_name: String,
}

impl WritableArguments for SelectPresetRequest {
    fn write_arguments(&self, w: &mut ArgumentWriter<'_>) -> anyhow::Result<()> {
        w.write_argument("InstanceID", &self.instance_id)?;
        w.write_argument("PresetName", &self.preset_name)?;
        Ok(())
    }
}

/// Output arguments of `SelectPreset`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectPresetResponse;

impl ScannableArguments for SelectPresetResponse {
    fn scan_arguments(_scanner: &mut ArgumentScanner) -> Result<Self, ActionCallError> {
        Ok(Self)
    }
}

/// Input arguments of `GetMute`
#[derive(Debug, Clone, PartialEq)]
pub struct GetMuteRequest {
    /// `A_ARG_TYPE_InstanceID`
    pub instance_id: u32,
    /// `A_ARG_TYPE_Channel`, one of `Master`, `LF`, `RF`
    pub channel: String,
}

impl WritableArguments for GetMuteRequest {
    fn write_arguments(&self, w: &mut ArgumentWriter<'_>) -> anyhow::Result<()> {
        w.write_argument("InstanceID", &self.instance_id)?;
        w.write_argument("Channel", &self.channel)?;
        Ok(())
    }
}

/// Output arguments of `GetMute`
#[derive(Debug, Clone, PartialEq)]
pub struct GetMuteResponse {
    /// `Mute`
    pub current_mute: bool,
}

impl ScannableArguments for GetMuteResponse {
    fn scan_arguments(scanner: &mut ArgumentScanner) -> Result<Self, ActionCallError> {
        Ok(Self {
            current_mute: scanner.next("CurrentMute")?,
        })
    }
}

/// Input arguments of `SetMute`
#[derive(Debug, Clone, PartialEq)]
pub struct SetMuteRequest {
    /// `A_ARG_TYPE_InstanceID`
    pub instance_id: u32,
    /// `A_ARG_TYPE_Channel`, one of `Master`, `LF`, `RF`
    pub channel: String,
    /// `Mute`
    pub desired_mute: bool,
}

impl WritableArguments for SetMuteRequest {
    fn write_arguments(&self, w: &mut ArgumentWriter<'_>) -> anyhow::Result<()> {
        w.write_argument("InstanceID", &self.instance_id)?;
        w.write_argument("Channel", &self.channel)?;
        w.write_argument("DesiredMute", &self.desired_mute)?;
        Ok(())
    }
}

/// Output arguments of `SetMute`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetMuteResponse;

impl ScannableArguments for SetMuteResponse {
    fn scan_arguments(_scanner: &mut ArgumentScanner) -> Result<Self, ActionCallError> {
        Ok(Self)
    }
}

/// Input arguments of `GetVolume`
#[derive(Debug, Clone, PartialEq)]
pub struct GetVolumeRequest {
    /// `A_ARG_TYPE_InstanceID`
    pub instance_id: u32,
    /// `A_ARG_TYPE_Channel`, one of `Master`, `LF`, `RF`
    pub channel: String,
}

impl WritableArguments for GetVolumeRequest {
    fn write_arguments(&self, w: &mut ArgumentWriter<'_>) -> anyhow::Result<()> {
        w.write_argument("InstanceID", &self.instance_id)?;
        w.write_argument("Channel", &self.channel)?;
        Ok(())
    }
}

/// Output arguments of `GetVolume`
#[derive(Debug, Clone, PartialEq)]
pub struct GetVolumeResponse {
    /// `Volume`, range `0..=100 step 1`
    pub current_volume: u16,
}

impl ScannableArguments for GetVolumeResponse {
    fn scan_arguments(scanner: &mut ArgumentScanner) -> Result<Self, ActionCallError> {
        Ok(Self {
            current_volume: scanner.next("CurrentVolume")?,
        })
    }
}

/// Input arguments of `SetVolume`
#[derive(Debug, Clone, PartialEq)]
pub struct SetVolumeRequest {
    /// `A_ARG_TYPE_InstanceID`
    pub instance_id: u32,
    /// `A_ARG_TYPE_Channel`, one of `Master`, `LF`, `RF`
    pub channel: String,
    /// `Volume`, range `0..=100 step 1`
    pub desired_volume: u16,
}

impl WritableArguments for SetVolumeRequest {
    fn write_arguments(&self, w: &mut ArgumentWriter<'_>) -> anyhow::Result<()> {
        w.write_argument("InstanceID", &self.instance_id)?;
        w.write_argument("Channel", &self.channel)?;
        w.write_argument("DesiredVolume", &self.desired_volume)?;
        Ok(())
    }
}

/// Output arguments of `SetVolume`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetVolumeResponse;

impl ScannableArguments for SetVolumeResponse {
    fn scan_arguments(_scanner: &mut ArgumentScanner) -> Result<Self, ActionCallError> {
        Ok(Self)
    }
}

/// Last observed values of the evented state variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderingControlState {
    /// `LastChange`
    pub last_change: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderingControlEvent {
    LastChange(String),
}

impl EventedState for RenderingControlState {
    type Event = RenderingControlEvent;

    fn apply(&mut self, variable: &str, value: &str) -> anyhow::Result<Option<Self::Event>> {
        let event = match variable {
            "LastChange" => {
                let value = String::from_xml_value(value)?;
                self.last_change = Some(value.clone());
                RenderingControlEvent::LastChange(value)
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

/// Client of `urn:schemas-upnp-org:service:RenderingControl:1`
#[derive(Debug)]
pub struct RenderingControl<T> {
    client: ServiceClient,
    transport: T,
    events: EventCache<RenderingControlState>,
}

impl<T: HttpTransport> RenderingControl<T> {
    pub fn descriptor() -> ServiceDescriptor {
        ServiceDescriptor {
            name: "RenderingControl".to_owned(),
            urn: URN {
                domain: "schemas-upnp-org".to_owned(),
                kind: UrnKind::Service,
                name: "RenderingControl".to_owned(),
                version: 1,
            },
            control_path: "/MediaRenderer/RenderingControl/Control".to_owned(),
            event_path: "/MediaRenderer/RenderingControl/Event".to_owned(),
        }
    }

    /// Resolve service endpoints against the device base url
    pub fn new(transport: T, base_url: &Url) -> anyhow::Result<Self> {
        let client = ServiceClient::new(base_url, &Self::descriptor())?;
        Ok(Self {
            client,
            transport,
            events: EventCache::new(RenderingControlState::default()),
        })
    }

    pub fn client(&self) -> &ServiceClient {
        &self.client
    }

    pub async fn list_presets(&self, request: &ListPresetsRequest) -> ActionCallResult<ListPresetsResponse> {
        self.client
            .run_action(&self.transport, "ListPresets", request)
            .await
    }

    pub async fn select_preset(&self, request: &SelectPresetRequest) -> ActionCallResult<SelectPresetResponse> {
        self.client
            .run_action(&self.transport, "SelectPreset", request)
            .await
    }

    pub async fn get_mute(&self, request: &GetMuteRequest) -> ActionCallResult<GetMuteResponse> {
        self.client
            .run_action(&self.transport, "GetMute", request)
            .await
    }

    pub async fn set_mute(&self, request: &SetMuteRequest) -> ActionCallResult<SetMuteResponse> {
        self.client
            .run_action(&self.transport, "SetMute", request)
            .await
    }

    pub async fn get_volume(&self, request: &GetVolumeRequest) -> ActionCallResult<GetVolumeResponse> {
        self.client
            .run_action(&self.transport, "GetVolume", request)
            .await
    }

    pub async fn set_volume(&self, request: &SetVolumeRequest) -> ActionCallResult<SetVolumeResponse> {
        self.client
            .run_action(&self.transport, "SetVolume", request)
            .await
    }

    /// Fold property change notification into the cached state
    pub fn parse_event(&self, raw: &[u8]) -> Vec<RenderingControlEvent> {
        self.events.parse_event(raw)
    }

    pub fn state(&self) -> RenderingControlState {
        self.events.snapshot()
    }
}
