use magictimer_core::Catalog;

pub fn activities() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::default();
    let json = serde_json::to_string_pretty(catalog.activities())?;
    println!("{json}");
    Ok(())
}

pub fn characters() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::default();
    let json = serde_json::to_string_pretty(catalog.characters())?;
    println!("{json}");
    Ok(())
}
