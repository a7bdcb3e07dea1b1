//! Categories command.

use console::style;

use crate::config::Settings;

/// List the category table with indices for `run --category`.
pub fn cmd_categories(settings: &Settings) -> anyhow::Result<()> {
    let table = settings.category_table();
    println!("{} {} categories:", style("→").cyan(), table.len());
    for (index, category) in table.all().iter().enumerate() {
        let marker = if category.is_parent() {
            format!(" {}", style("(has subcategories)").dim())
        } else {
            String::new()
        };
        println!("  [{}] {}{}", index, style(&category.name).bold(), marker);
        println!("      {}", category.canonical_url);
    }
    Ok(())
}
