use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::urn::URN;

/// Identity and endpoints of one service on a device.
///
/// Paths are relative and get resolved against the device base url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub urn: URN,
    pub control_path: String,
    pub event_path: String,
}

impl ServiceDescriptor {
    /// Conventional `/<device>/<service>/Control` and `/<device>/<service>/Event` layout
    pub fn on_device(device: &str, urn: URN) -> Self {
        let name = urn.name.clone();
        Self {
            control_path: format!("/{device}/{name}/Control"),
            event_path: format!("/{device}/{name}/Event"),
            name,
            urn,
        }
    }

    /// Services that are not scoped by device type: `/<service>/Control`
    pub fn unscoped(urn: URN) -> Self {
        let name = urn.name.clone();
        Self {
            control_path: format!("/{name}/Control"),
            event_path: format!("/{name}/Event"),
            name,
            urn,
        }
    }
}

/// Services with a well known endpoint layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownService {
    ContentDirectory,
    ConnectionManager,
    AVTransport,
    RenderingControl,
    GroupRenderingControl,
    ZoneGroupTopology,
    GroupManagement,
}

impl KnownService {
    pub const ALL: [KnownService; 7] = [
        KnownService::ContentDirectory,
        KnownService::ConnectionManager,
        KnownService::AVTransport,
        KnownService::RenderingControl,
        KnownService::GroupRenderingControl,
        KnownService::ZoneGroupTopology,
        KnownService::GroupManagement,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            KnownService::ContentDirectory => "ContentDirectory",
            KnownService::ConnectionManager => "ConnectionManager",
            KnownService::AVTransport => "AVTransport",
            KnownService::RenderingControl => "RenderingControl",
            KnownService::GroupRenderingControl => "GroupRenderingControl",
            KnownService::ZoneGroupTopology => "ZoneGroupTopology",
            KnownService::GroupManagement => "GroupManagement",
        }
    }

    /// Device type the service lives under, `None` for services at the device root
    pub fn device(&self) -> Option<&'static str> {
        match self {
            KnownService::ContentDirectory => Some("MediaServer"),
            KnownService::ConnectionManager
            | KnownService::AVTransport
            | KnownService::RenderingControl
            | KnownService::GroupRenderingControl => Some("MediaRenderer"),
            KnownService::ZoneGroupTopology | KnownService::GroupManagement => None,
        }
    }

    pub fn urn(&self) -> URN {
        URN::service(self.name(), 1)
    }

    pub fn descriptor(&self) -> ServiceDescriptor {
        match self.device() {
            Some(device) => ServiceDescriptor::on_device(device, self.urn()),
            None => ServiceDescriptor::unscoped(self.urn()),
        }
    }
}

impl Display for KnownService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for KnownService {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|service| service.name() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown service: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{KnownService, ServiceDescriptor};
    use crate::urn::URN;

    #[test]
    fn known_service_paths() {
        let content_directory = KnownService::ContentDirectory.descriptor();
        assert_eq!(
            content_directory.control_path,
            "/MediaServer/ContentDirectory/Control"
        );
        assert_eq!(
            content_directory.event_path,
            "/MediaServer/ContentDirectory/Event"
        );
        assert_eq!(
            content_directory.urn.to_string(),
            "urn:schemas-upnp-org:service:ContentDirectory:1"
        );

        let topology = KnownService::ZoneGroupTopology.descriptor();
        assert_eq!(topology.control_path, "/ZoneGroupTopology/Control");
    }

    #[test]
    fn known_service_from_name() {
        for service in KnownService::ALL {
            assert_eq!(service.name().parse::<KnownService>().unwrap(), service);
        }
        assert!("Printer".parse::<KnownService>().is_err());
    }

    #[test]
    fn custom_device() {
        let descriptor = ServiceDescriptor::on_device("Printer", URN::service("PrintBasic", 1));
        assert_eq!(descriptor.control_path, "/Printer/PrintBasic/Control");
        assert_eq!(descriptor.name, "PrintBasic");
    }
}
