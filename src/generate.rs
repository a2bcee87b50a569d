use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use upnp::{
    binding::ServiceDefinition,
    codegen::{module_name, render_with, RenderOptions},
};

use crate::config::{BindgenConfig, ServiceEntry};

/// Generated source of one service
#[derive(Debug, Clone)]
pub struct GeneratedService {
    pub name: String,
    pub module: String,
    pub source: String,
}

pub fn load_definition(entry: &ServiceEntry) -> anyhow::Result<ServiceDefinition> {
    let raw = fs::read(&entry.scpd)
        .with_context(|| format!("read service description {}", entry.scpd.display()))?;
    let definition = ServiceDefinition::from_xml(entry.descriptor(), &raw)
        .with_context(|| format!("synthesize {} binding", entry.name))?;
    Ok(definition)
}

pub fn generate_service(
    entry: &ServiceEntry,
    options: &RenderOptions,
) -> anyhow::Result<GeneratedService> {
    let definition = load_definition(entry)?;
    let source = render_with(&definition, options)
        .with_context(|| format!("render {} binding", entry.name))?;
    tracing::debug!(
        "Rendered {} with {} operations",
        entry.name,
        definition.operations.len()
    );
    Ok(GeneratedService {
        name: entry.name.clone(),
        module: module_name(&definition),
        source,
    })
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    pub generated: Vec<GeneratedService>,
    pub failures: Vec<(String, anyhow::Error)>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Generate every configured service. Failure of one service does not stop the rest
pub fn generate_all(config: &BindgenConfig) -> GenerationReport {
    let options = config.render_options();
    let mut report = GenerationReport::default();
    for entry in &config.services {
        match generate_service(entry, &options) {
            Ok(service) => {
                tracing::info!("Generated {} binding", service.name);
                report.generated.push(service);
            }
            Err(e) => {
                tracing::error!("Failed to generate {} binding: {e:#}", entry.name);
                report.failures.push((entry.name.clone(), e));
            }
        }
    }
    report
}

pub fn write_module(dir: &Path, service: &GeneratedService) -> anyhow::Result<PathBuf> {
    let path = dir.join(format!("{}.rs", service.module));
    fs::write(&path, &service.source).with_context(|| format!("write {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path)
}

/// Write `<module>.rs` per service together with `mod.rs` declaring them
pub fn write_output(dir: &Path, services: &[GeneratedService]) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut written = Vec::with_capacity(services.len() + 1);
    let mut modules = String::new();
    for service in services {
        written.push(write_module(dir, service)?);
        let _ = writeln!(modules, "pub mod {};", service.module);
    }
    let mod_path = dir.join("mod.rs");
    fs::write(&mod_path, modules).with_context(|| format!("write {}", mod_path.display()))?;
    written.push(mod_path);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use upnp::binding::SchemaError;

    use crate::config::{BindgenConfig, ServiceEntry};

    use super::{generate_all, generate_service, write_output};

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("upnp")
            .join("fixtures")
            .join(name)
    }

    #[test_log::test]
    fn generate_rendering_control() {
        let entry = ServiceEntry::new("RenderingControl", fixture("RenderingControl.xml"));
        let service = generate_service(&entry, &Default::default()).unwrap();
        assert_eq!(service.module, "rendering_control");
        assert!(service.source.contains("use upnp::"));
        assert!(service.source.contains("pub struct RenderingControl<T> {"));
    }

    #[test_log::test]
    fn batch_keeps_going_after_failure() {
        let config = BindgenConfig {
            services: vec![
                ServiceEntry::new("Broken", fixture("Unresolved.xml")),
                ServiceEntry::new("Missing", fixture("DoesNotExist.xml")),
                ServiceEntry::new("ConnectionManager", fixture("ConnectionManager.xml")),
            ],
            ..Default::default()
        };
        let report = generate_all(&config);
        assert!(!report.is_success());
        assert_eq!(report.generated.len(), 1);
        assert_eq!(report.generated[0].module, "connection_manager");

        let failed: Vec<_> = report.failures.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(failed, ["Broken", "Missing"]);
        let schema_error = report.failures[0].1.downcast_ref::<SchemaError>();
        assert!(matches!(
            schema_error,
            Some(SchemaError::UnresolvedStateVariable { .. })
        ));
    }

    #[test_log::test]
    fn write_modules() {
        let config = BindgenConfig {
            services: vec![
                ServiceEntry::new("RenderingControl", fixture("RenderingControl.xml")),
                ServiceEntry::new("ContentDirectory", fixture("ContentDirectory.xml")),
            ],
            ..Default::default()
        };
        let report = generate_all(&config);
        assert!(report.is_success());

        let dir = std::env::temp_dir().join(format!("upnp-bindgen-{}", std::process::id()));
        let written = write_output(&dir, &report.generated).unwrap();
        assert_eq!(written.len(), 3);
        let mod_rs = std::fs::read_to_string(dir.join("mod.rs")).unwrap();
        assert_eq!(
            mod_rs,
            "pub mod rendering_control;\npub mod content_directory;\n"
        );
        let rendering = std::fs::read_to_string(dir.join("rendering_control.rs")).unwrap();
        assert_eq!(rendering, report.generated[0].source);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
