//! Instance lifecycle subcommands

use cirrus_cloud::{CloudProvider, CreateOptions, Instance, ProviderRegistry};
use cirrus_config::CirrusConfig;
use colored::Colorize;

pub fn providers(registry: &ProviderRegistry, config: &CirrusConfig) {
    println!("{}", "Registered provider types:".bold());
    for name in registry.available_providers() {
        println!("  {}", name);
    }

    println!();
    println!("{}", "Configured providers:".bold());
    for (name, settings) in &config.providers {
        let marker = if settings.default {
            " (default)".green().to_string()
        } else {
            String::new()
        };
        let region = settings.region.as_deref().unwrap_or("-");
        println!("  {} [region: {}]{}", name, region, marker);
    }
}

pub async fn list(
    registry: &ProviderRegistry,
    config: &CirrusConfig,
    provider: Option<&str>,
) -> anyhow::Result<()> {
    let providers: Vec<Box<dyn CloudProvider>> = match provider {
        Some(name) => vec![registry.create_provider(name, &config.providers).await?],
        None => registry
            .create_multi_provider(&config.providers)
            .await?
            .into_iter()
            .map(|(_, provider)| provider)
            .collect(),
    };

    for provider in &providers {
        let instances = provider.list_instances().await?;
        println!(
            "{} {} ({} instances)",
            "==".dimmed(),
            provider.provider_name().bold(),
            instances.len()
        );
        for instance in &instances {
            print_instance_line(instance);
        }
    }
    Ok(())
}

pub async fn create(
    registry: &ProviderRegistry,
    config: &CirrusConfig,
    name: &str,
    instance_type: &str,
    provider: Option<&str>,
    wait: bool,
) -> anyhow::Result<()> {
    let provider = resolve_provider(registry, config, provider).await?;

    let options = CreateOptions::new()
        .set("wait_for_running", wait)
        .set("wait_for_completion", wait);

    let instance = provider
        .create_instance(name, instance_type, &options)
        .await?;

    println!(
        "{} {}",
        "Created".green().bold(),
        instance.display_name()
    );
    print_instance_details(&instance);
    Ok(())
}

pub async fn get(
    registry: &ProviderRegistry,
    config: &CirrusConfig,
    id: &str,
    provider: Option<&str>,
) -> anyhow::Result<()> {
    let provider = resolve_provider(registry, config, provider).await?;

    match provider.get_instance(id).await? {
        Some(instance) => print_instance_details(&instance),
        None => println!("{} instance {} not found", "!".yellow().bold(), id),
    }
    Ok(())
}

pub async fn delete(
    registry: &ProviderRegistry,
    config: &CirrusConfig,
    id: &str,
    provider: Option<&str>,
) -> anyhow::Result<()> {
    let provider = resolve_provider(registry, config, provider).await?;

    if provider.delete_instance(id).await? {
        println!("{} deletion of {} initiated", "OK".green().bold(), id);
    } else {
        println!("{} deletion of {} not confirmed", "!".yellow().bold(), id);
    }
    Ok(())
}

async fn resolve_provider(
    registry: &ProviderRegistry,
    config: &CirrusConfig,
    provider: Option<&str>,
) -> anyhow::Result<Box<dyn CloudProvider>> {
    let provider = match provider {
        Some(name) => registry.create_provider(name, &config.providers).await?,
        None => registry.create_default_provider(&config.providers).await?,
    };
    Ok(provider)
}

fn print_instance_line(instance: &Instance) {
    let status = match () {
        _ if instance.is_running() => instance.status.to_string().green(),
        _ if instance.is_transitioning() => instance.status.to_string().yellow(),
        _ => instance.status.to_string().dimmed(),
    };
    let endpoint = instance.endpoint().unwrap_or("-");
    println!(
        "  {} [{}] {}",
        instance.display_name(),
        status,
        endpoint.dimmed()
    );
}

fn print_instance_details(instance: &Instance) {
    println!("  id:       {}", instance.id);
    println!("  name:     {}", instance.name);
    println!("  type:     {}", instance.instance_type);
    println!("  status:   {}", instance.status);
    println!("  provider: {}", instance.provider);
    println!("  region:   {}", instance.region);
    if let Some(endpoint) = instance.endpoint() {
        println!("  endpoint: {}", endpoint);
    }
    if let Some(created) = instance.created_at {
        println!("  created:  {}", created);
    }
}
