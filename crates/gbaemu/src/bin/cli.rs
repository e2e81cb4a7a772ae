use clap::Parser;
use gbaemu::{Args, EmulatorCore, StopReason, load_images};
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
    let images = match load_images(&args) {
        Ok(images) => images,
        Err(e) => {
            eprintln!("Failed to load images: {}", e);
            std::process::exit(2);
        }
    };

    // Create emulator config from args
    let config = args.to_emulator_config();

    // Create emulator
    info!("=== Creating Emulator ===");
    let mut emulator = match EmulatorCore::new(&images.bios, &images.rom, config) {
        Ok(emu) => emu,
        Err(e) => {
            eprintln!("Failed to create emulator: {}", e);
            std::process::exit(2);
        }
    };

    info!("Entry: {:#X}", emulator.pc());

    // Run emulator
    info!("=== Running Emulator (Headless) ===");
    let stop_reason = emulator.run();

    // Log final state
    info!("=== Emulation Complete ===");
    info!("Stop reason: {:?}", stop_reason);
    emulator.print_final_state();

    let exit_code = match stop_reason {
        StopReason::Error(msg) => {
            eprintln!("Emulator error: {}", msg);
            2
        }
        StopReason::Timeout => {
            eprintln!("Timeout reached before stop conditions met");
            1
        }
        StopReason::StopCondition => match args.stop_pc {
            Some(expected) if !(emulator.stopped() && emulator.pc() == expected) => {
                // max_instructions or the frame limit was hit first
                eprintln!(
                    "CPU did not reach expected PC {:#X} (actual: {:#X})",
                    expected,
                    emulator.pc()
                );
                1
            }
            _ => {
                info!("PASS: Stop condition reached");
                0
            }
        },
    };

    std::process::exit(exit_code);
}
