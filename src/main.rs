use std::{fs, time::Duration};

use anyhow::Context;
use clap::Parser;
use upnp::binding::{ServiceBinding, ServiceDefinition};
use upnp_bindgen::config::{Args, BindgenConfig, Command, ServiceEntry};
use upnp_bindgen::generate::{self, generate_all, generate_service, write_module, write_output};
use upnp_bindgen::tracing::init_tracer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = BindgenConfig::load(args.config.as_deref())?;
    init_tracer(args.log_level.unwrap_or(config.log_level.into()));

    match args.command {
        Command::Generate { service, output } => {
            let entry = service.into_entry()?;
            let generated = generate_service(&entry, &config.render_options())?;
            match output {
                Some(dir) => {
                    fs::create_dir_all(&dir)?;
                    let path = write_module(&dir, &generated)?;
                    tracing::info!("Wrote {}", path.display());
                }
                None => print!("{}", generated.source),
            }
        }
        Command::Batch { output_dir } => {
            anyhow::ensure!(!config.services.is_empty(), "No services are configured");
            let output_dir = output_dir
                .or_else(|| config.output_dir.clone())
                .context("output directory is not configured")?;
            let report = generate_all(&config);
            write_output(&output_dir, &report.generated)?;
            tracing::info!(
                "Generated {} of {} bindings into {}",
                report.generated.len(),
                config.services.len(),
                output_dir.display()
            );
            if !report.is_success() {
                let failed: Vec<_> = report.failures.iter().map(|(name, _)| name.as_str()).collect();
                anyhow::bail!("Failed to generate bindings: {}", failed.join(", "));
            }
        }
        Command::Inspect { service } => {
            let entry = service.into_entry()?;
            let definition = generate::load_definition(&entry)?;
            print_definition(&definition);
        }
        Command::Call {
            service,
            base_url,
            action,
            arguments,
            timeout,
        } => {
            let entry = service.into_entry()?;
            call(entry, base_url, &action, &arguments, timeout).await?;
        }
    }
    Ok(())
}

fn print_definition(definition: &ServiceDefinition) {
    let descriptor = &definition.descriptor;
    println!("{} ({})", descriptor.name, descriptor.urn);
    println!("  control: {}", descriptor.control_path);
    println!("  event: {}", descriptor.event_path);
    for operation in &definition.operations {
        println!("{}", operation.name);
        for field in &operation.request.fields {
            println!("  in  {}: {}", field.name, field.value_type);
        }
        for field in &operation.response.fields {
            println!("  out {}: {}", field.name, field.value_type);
        }
    }
    if definition.is_evented() {
        println!("Evented variables");
        for variable in &definition.evented {
            println!("  {}: {}", variable.name, variable.value_type);
        }
    }
}

async fn call(
    entry: ServiceEntry,
    base_url: url::Url,
    action: &str,
    arguments: &[String],
    timeout: u64,
) -> anyhow::Result<()> {
    let definition = generate::load_definition(&entry)?;
    let operation = definition
        .operation(action)
        .with_context(|| format!("{} does not declare {action} action", entry.name))?;
    let pairs = arguments
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .with_context(|| format!("argument {pair} is not in Name=value form"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let arguments = operation.arguments_from_text(pairs)?;

    let binding = ServiceBinding::new(definition, &base_url)?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()?;
    tracing::debug!(
        "Invoking {action} at {}",
        binding.client().control_url()
    );
    let response = binding.invoke(&client, action, &arguments).await?;
    for (name, value) in response {
        println!("{name}: {value}");
    }
    Ok(())
}
