use dicom_pseudonymizer::config::ConfigBuilder;

// Prints the default configuration as JSON, as a starting point for a rules file.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigBuilder::default().build();

    let json = serde_json::to_string_pretty(&config)?;
    println!("{json}");

    Ok(())
}
