use std::{fmt::Display, str::FromStr};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const UPNP_DOMAIN: &str = "schemas-upnp-org";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrnKind {
    Device,
    Service,
}

impl Display for UrnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrnKind::Device => write!(f, "device"),
            UrnKind::Service => write!(f, "service"),
        }
    }
}

/// Uniform Resource Name. Provides a unique and persistent identifier for a resource.
///
/// `urn:<domain>:<kind>:<type>:<version>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct URN {
    pub domain: String,
    pub kind: UrnKind,
    pub name: String,
    pub version: u8,
}

impl URN {
    pub fn service(name: impl Into<String>, version: u8) -> Self {
        Self {
            domain: UPNP_DOMAIN.to_owned(),
            kind: UrnKind::Service,
            name: name.into(),
            version,
        }
    }

    pub fn is_service(&self) -> bool {
        self.kind == UrnKind::Service
    }
}

impl Display for URN {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "urn:{domain}:{kind}:{name}:{version}",
            domain = self.domain,
            kind = self.kind,
            name = self.name,
            version = self.version
        )
    }
}

impl FromStr for URN {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(5, ':');
        let urn = parts.next().context("urn prefix")?;
        anyhow::ensure!(urn == "urn", "expected urn prefix, got {urn}");
        let domain = parts.next().context("domain")?;
        let kind = match parts.next().context("urn kind")? {
            "device" => UrnKind::Device,
            "service" => UrnKind::Service,
            rest => anyhow::bail!("unknown urn kind: {rest}"),
        };
        let name = parts.next().context("service/device name")?;
        anyhow::ensure!(!name.is_empty(), "empty service/device name");
        let version = parts
            .next()
            .context("service/device version")?
            .parse()
            .context("parse version")?;
        Ok(URN {
            domain: domain.to_owned(),
            kind,
            name: name.to_owned(),
            version,
        })
    }
}

impl Serialize for URN {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for URN {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
