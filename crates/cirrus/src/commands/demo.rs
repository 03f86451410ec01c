//! Lifecycle walkthrough across every configured provider
//!
//! The original portfolio demo: list, create, fetch and delete one
//! instance per provider, then a multi-provider summary. Per-provider
//! failures are reported and the walkthrough moves on.

use cirrus_cloud::{CloudProvider, CreateOptions, ProviderRegistry};
use cirrus_config::CirrusConfig;
use colored::Colorize;

pub async fn run(registry: &ProviderRegistry, config: &CirrusConfig) -> anyhow::Result<()> {
    for provider_type in config.providers.keys() {
        if !registry.is_registered(provider_type) {
            tracing::warn!("Skipping unregistered provider type: {}", provider_type);
            continue;
        }
        if let Err(e) = single_provider(registry, config, provider_type).await {
            eprintln!(
                "{} {} walkthrough failed: {}",
                "!".red().bold(),
                provider_type,
                e
            );
        }
        println!();
    }

    multi_provider(registry, config).await
}

async fn single_provider(
    registry: &ProviderRegistry,
    config: &CirrusConfig,
    provider_type: &str,
) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("=== {} provider ===", provider_type.to_uppercase()).bold()
    );

    let provider = registry.create_provider(provider_type, &config.providers).await?;

    let existing = provider.list_instances().await?;
    println!("Found {} existing instances", existing.len());
    for instance in &existing {
        println!("  - {} [{}]", instance.display_name(), instance.status);
    }

    let name = format!("demo-instance-{}", provider_type);
    let instance_type = demo_instance_type(provider_type);
    println!("Creating instance {} ({})", name, instance_type);

    let options = CreateOptions::new().set("wait_for_running", false);
    let created = provider.create_instance(&name, instance_type, &options).await?;
    println!("{} {}", "Created".green(), created.display_name());

    match provider.get_instance(&created.id).await? {
        Some(fetched) => {
            println!(
                "Retrieved {} [{}] endpoint: {}",
                fetched.display_name(),
                fetched.status,
                fetched.endpoint().unwrap_or("-")
            );
        }
        None => println!("{} could not retrieve {} yet", "!".yellow(), created.id),
    }

    println!("Cleaning up {}", created.id);
    if provider.delete_instance(&created.id).await? {
        println!("{} deletion initiated", "OK".green());
    }

    Ok(())
}

async fn multi_provider(
    registry: &ProviderRegistry,
    config: &CirrusConfig,
) -> anyhow::Result<()> {
    println!("{}", "=== Multi-cloud summary ===".bold());

    let providers = registry.create_multi_provider(&config.providers).await?;
    println!(
        "Created {} providers: {}",
        providers.len(),
        providers.keys().cloned().collect::<Vec<_>>().join(", ")
    );

    for (name, provider) in &providers {
        match provider.list_instances().await {
            Ok(instances) => {
                let running = instances.iter().filter(|i| i.is_running()).count();
                let stopped = instances.iter().filter(|i| i.is_stopped()).count();
                let transitioning = instances.iter().filter(|i| i.is_transitioning()).count();
                println!(
                    "{}: {} instances (running: {}, stopped: {}, transitioning: {})",
                    name,
                    instances.len(),
                    running,
                    stopped,
                    transitioning
                );
            }
            Err(e) => eprintln!("{} {}: {}", "!".red(), name, e),
        }
    }

    let default_provider: Box<dyn CloudProvider> =
        registry.create_default_provider(&config.providers).await?;
    println!("Default provider: {}", default_provider.provider_name().bold());

    Ok(())
}

fn demo_instance_type(provider_type: &str) -> &'static str {
    match provider_type {
        "aws" => "t3.micro",
        "azure" => "Standard_B1s",
        _ => "small",
    }
}
