//! Category listing command.

use console::style;

use doclassify::classify::UNCATEGORIZED;
use doclassify::config::Config;

/// Print the configured categories and the prompt built from them.
pub fn cmd_categories(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("Categories").bold());
    for category in config.categories.categories() {
        println!("  {}", style(&category.name).cyan());
        if !category.keywords.is_empty() {
            println!("    {}", style(category.keywords.join(", ")).dim());
        }
    }
    println!("  {}", style(UNCATEGORIZED).cyan());

    println!("\n{}", style("Classification prompt").bold());
    println!("{}", config.categories.system_prompt());

    Ok(())
}
