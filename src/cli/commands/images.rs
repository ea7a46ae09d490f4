use anyhow::Result;

use crate::services::{ImageCatalog, default_data_dirs};

pub fn execute_images_command(json: bool) -> Result<()> {
    let catalog = ImageCatalog::discover();

    if json {
        println!("{}", serde_json::to_string_pretty(catalog.images())?);
        return Ok(());
    }

    if catalog.is_empty() {
        println!("No boot images installed. Searched:");
        for dir in default_data_dirs() {
            println!("  {}", dir.join(crate::services::IMAGE_SUBDIR).display());
        }
        return Ok(());
    }

    println!("📦 Installed boot images:");
    for image in catalog.images() {
        println!("  {:<12} {}", image.name, image.description);
        println!("  {:<12} {}", "", image.path.display());
    }
    Ok(())
}
