//! Environment check command.

use console::style;

use doclassify::config::{user_config_path, Config};
use doclassify::extract::check_tools;
use doclassify::llm::Provider;

/// Report extraction tool availability and provider credentials.
pub fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("Configuration").bold());
    match &config.source_path {
        Some(path) => println!("  Loaded from {}", path.display()),
        None => {
            println!("  {}", style("No config file found, using defaults").dim());
            if let Some(path) = user_config_path() {
                println!("  {}", style(format!("User config location: {}", path.display())).dim());
            }
        }
    }
    println!("  Input directory: {}", config.input_dir().display());
    println!("  Summary provider: {}", config.summary_provider);

    println!("\n{}", style("Extraction Tools:").cyan());
    let tools = check_tools();
    for (tool, available) in &tools {
        let status = if *available {
            style("✓ found").green()
        } else {
            style("✗ not found").red()
        };
        println!("  {:<12} {}", tool, status);
    }

    println!("\n{}", style("Providers:").cyan());
    for provider in Provider::ALL {
        let resolved = config.provider_config(provider);
        let credential = match provider.credential_env() {
            None => style("no key needed".to_string()).dim(),
            Some(var) if resolved.api_key.is_some() => style(format!("✓ {} set", var)).green(),
            Some(var) => style(format!("✗ {} not set", var)).red(),
        };
        println!("  {:<12} {}", provider.as_str(), credential);
        println!(
            "  {:<12} {}",
            "",
            style(format!("{} ({})", resolved.endpoint, resolved.model)).dim()
        );
    }

    println!();
    if tools.iter().all(|(_, available)| *available) {
        println!("{} PDF extraction is available", style("✓").green());
    } else {
        println!(
            "{} pdftotext not found; PDF documents will be classified from empty text",
            style("!").yellow()
        );
        println!(
            "  {}",
            style("Install poppler-utils (apt) or poppler (brew)").dim()
        );
    }

    Ok(())
}
