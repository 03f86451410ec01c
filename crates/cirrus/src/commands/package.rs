//! Delivery packaging subcommand

use cirrus_delivery::DeliveryPackager;
use colored::Colorize;
use std::path::Path;

pub fn run(output: Option<&Path>) -> anyhow::Result<()> {
    let root = std::env::current_dir()?;
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string());

    let packager = DeliveryPackager::new(&root)?;
    let output = output.unwrap_or(&root);
    let manifest = packager.package(output, &name)?;
    let readme = packager.write_delivery_readme(&manifest)?;

    println!(
        "{} {}",
        "Created".green().bold(),
        manifest.archive_path.display()
    );
    println!(
        "  {} files, {:.2} MB",
        manifest.file_count,
        manifest.total_bytes as f64 / (1024.0 * 1024.0)
    );
    println!("  delivery note: {}", readme.display());
    Ok(())
}
