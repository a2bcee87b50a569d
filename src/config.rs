use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use upnp::{
    codegen::RenderOptions,
    service::{KnownService, ServiceDescriptor},
    urn::URN,
};

pub const CONFIG_FILE_NAME: &str = "bindgen.toml";
const APP_NAME: &str = "upnp-bindgen";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for ConfigLogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(anyhow::anyhow!("{} does not match any log level", s)),
        }
    }
}

impl Display for ConfigLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level: tracing::Level = (*self).into();
        write!(f, "{}", level)
    }
}

impl From<tracing::Level> for ConfigLogLevel {
    fn from(value: tracing::Level) -> Self {
        match value {
            tracing::Level::TRACE => Self::Trace,
            tracing::Level::WARN => Self::Warn,
            tracing::Level::DEBUG => Self::Debug,
            tracing::Level::ERROR => Self::Error,
            tracing::Level::INFO => Self::Info,
        }
    }
}

impl From<ConfigLogLevel> for tracing::Level {
    fn from(value: ConfigLogLevel) -> Self {
        match value {
            ConfigLogLevel::Trace => tracing::Level::TRACE,
            ConfigLogLevel::Debug => tracing::Level::DEBUG,
            ConfigLogLevel::Info => tracing::Level::INFO,
            ConfigLogLevel::Warn => tracing::Level::WARN,
            ConfigLogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// One `[[services]]` entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceEntry {
    pub name: String,
    /// Path to the service description, relative to the config file
    pub scpd: PathBuf,
    #[serde(default)]
    pub service_type: Option<URN>,
    /// Device type the endpoints are scoped by, `/<device>/<name>/Control`
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub control_path: Option<String>,
    #[serde(default)]
    pub event_path: Option<String>,
}

impl ServiceEntry {
    pub fn new(name: impl Into<String>, scpd: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            scpd: scpd.into(),
            service_type: None,
            device: None,
            control_path: None,
            event_path: None,
        }
    }

    /// Endpoints of the entry.
    ///
    /// Explicit paths win over the device layout, known services fill in the rest.
    pub fn descriptor(&self) -> ServiceDescriptor {
        let known = KnownService::from_str(&self.name).ok();
        let urn = self
            .service_type
            .clone()
            .or_else(|| known.map(|k| k.urn()))
            .unwrap_or_else(|| URN::service(self.name.as_str(), 1));

        let mut descriptor = match (&self.device, known) {
            (Some(device), _) => ServiceDescriptor::on_device(device, urn),
            (None, Some(known)) => ServiceDescriptor {
                urn,
                ..known.descriptor()
            },
            (None, None) => ServiceDescriptor::unscoped(urn),
        };
        descriptor.name = self.name.clone();
        if let Some(control_path) = &self.control_path {
            descriptor.control_path = control_path.clone();
        }
        if let Some(event_path) = &self.event_path {
            descriptor.event_path = event_path.clone();
        }
        descriptor
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BindgenConfig {
    pub log_level: ConfigLogLevel,
    /// Generated modules are printed to stdout when absent
    pub output_dir: Option<PathBuf>,
    /// Path generated modules use to reach the runtime crate
    pub runtime_crate: String,
    pub services: Vec<ServiceEntry>,
}

impl Default for BindgenConfig {
    fn default() -> Self {
        Self {
            log_level: ConfigLogLevel::default(),
            output_dir: None,
            runtime_crate: RenderOptions::default().runtime,
            services: Vec::new(),
        }
    }
}

impl BindgenConfig {
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Read config file. Relative paths inside are resolved against its directory
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let mut config = Self::from_toml(&raw)
            .with_context(|| format!("parse config file {}", path.display()))?;
        if let Some(root) = path.parent() {
            config.resolve_paths(root);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, root: &Path) {
        for service in &mut self.services {
            if service.scpd.is_relative() {
                service.scpd = root.join(&service.scpd);
            }
        }
        if let Some(output_dir) = &mut self.output_dir {
            if output_dir.is_relative() {
                *output_dir = root.join(&output_dir);
            }
        }
    }

    /// Explicit path, then `bindgen.toml` in the working directory, then the user config directory
    pub fn locate(explicit: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            anyhow::ensure!(
                path.try_exists()?,
                "config file {} does not exist",
                path.display()
            );
            return Ok(Some(path.to_path_buf()));
        }
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.try_exists()? {
            return Ok(Some(local));
        }
        let user = dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE_NAME));
        match user {
            Some(path) if path.try_exists()? => Ok(Some(path)),
            _ => Ok(None),
        }
    }

    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match Self::locate(explicit)? {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            runtime: self.runtime_crate.clone(),
        }
    }
}

/// Generate typed UPnP service bindings from service descriptions
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// Override log level
    #[arg(short, long, global = true)]
    pub log_level: Option<tracing::Level>,
    /// Provide custom config location
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

/// Endpoint overrides shared by commands that take a single description
#[derive(Debug, Clone, clap::Args)]
pub struct ServiceArgs {
    /// Service description (SCPD) file
    pub scpd: PathBuf,
    /// Service name, defaults to the file stem
    #[arg(short, long)]
    pub name: Option<String>,
    /// Service type URN, `urn:<domain>:service:<name>:<version>`
    #[arg(long)]
    pub service_type: Option<URN>,
    /// Device type used to scope control and event paths
    #[arg(long)]
    pub device: Option<String>,
    #[arg(long)]
    pub control_path: Option<String>,
    #[arg(long)]
    pub event_path: Option<String>,
}

impl ServiceArgs {
    pub fn into_entry(self) -> anyhow::Result<ServiceEntry> {
        let name = match self.name {
            Some(name) => name,
            None => self
                .scpd
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(ToOwned::to_owned)
                .context("service name can't be derived from the description path")?,
        };
        Ok(ServiceEntry {
            name,
            scpd: self.scpd,
            service_type: self.service_type,
            device: self.device,
            control_path: self.control_path,
            event_path: self.event_path,
        })
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate binding for a single service description
    Generate {
        #[command(flatten)]
        service: ServiceArgs,
        /// Write module into this directory instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate bindings for every service in the config file
    Batch {
        /// Override output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Print operations and evented variables of a service description
    Inspect {
        #[command(flatten)]
        service: ServiceArgs,
    },
    /// Invoke an action on a live device
    Call {
        #[command(flatten)]
        service: ServiceArgs,
        /// Device base url, endpoint paths are resolved against it
        #[arg(short, long)]
        base_url: url::Url,
        /// Action name as declared in the description
        action: String,
        /// Input arguments as `Name=value`
        arguments: Vec<String>,
        /// Request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}
