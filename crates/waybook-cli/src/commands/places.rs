//! Directory listing command

use anyhow::Result;

use super::open_importer;
use crate::cli::Cli;

pub async fn cmd_places(cli: &Cli, city: Option<&str>) -> Result<()> {
    let importer = open_importer(cli)?;
    let mut places = importer.list_places().await?;

    if let Some(city) = city {
        let wanted = city.to_lowercase();
        places.retain(|p| p.city.to_lowercase() == wanted);
    }

    if places.is_empty() {
        println!("No places found for {}", importer.tenant());
        return Ok(());
    }

    println!("📍 {} place(s) in {}", places.len(), importer.tenant());
    println!();
    let mut current_city = String::new();
    for place in &places {
        if place.city != current_city {
            current_city = place.city.clone();
            println!("{}", current_city);
        }
        let price = if place.price.is_empty() {
            String::new()
        } else {
            format!("  {}", place.price)
        };
        println!(
            "   {} ({}, {}){}",
            place.name, place.place_type, place.category, price
        );
    }
    Ok(())
}
