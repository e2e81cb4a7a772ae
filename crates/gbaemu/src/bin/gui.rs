use clap::Parser;
use gbaemu::{Args, EmulatorCore, display, load_images};
use tracing::info;

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load BIOS and ROM
    let images = load_images(&args).unwrap_or_else(|e| {
        eprintln!("Failed to load images: {}", e);
        std::process::exit(2);
    });

    // Create emulator config from args
    let config = args.to_emulator_config();

    // Create emulator
    info!("=== Creating Emulator ===");
    let emulator = EmulatorCore::new(&images.bios, &images.rom, config).unwrap_or_else(|e| {
        eprintln!("Failed to create emulator: {}", e);
        std::process::exit(2);
    });

    // Run with display
    info!("=== Starting Emulator with Display ===");
    info!("Entry: {:#X}", emulator.pc());

    if let Err(e) = display::run(emulator) {
        eprintln!("Display error: {}", e);
        std::process::exit(1);
    }
}
