use crate::EmulatorConfig;
use crate::loader::{self, Images, LoadError};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
pub struct Args {
    /// Path to the cartridge ROM image
    pub rom: PathBuf,

    /// Path to the BIOS image (required, there is no high-level BIOS)
    #[arg(long)]
    pub bios: PathBuf,

    /// Stop when the CPU reaches this PC (hex: 0x1234 or decimal: 1234)
    #[arg(long, value_parser = parse_hex_or_dec)]
    pub stop_pc: Option<u64>,

    /// Stop after this many instructions
    #[arg(long, short = 'i')]
    pub max_instructions: Option<u64>,

    /// Stop after this many milliseconds of wall-clock time
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Stop after this many emulated frames
    #[arg(long)]
    pub frames: Option<u64>,
}

impl Args {
    /// Validate that the arguments are consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.frames == Some(0) {
            return Err("--frames must be at least 1".to_string());
        }
        if self.max_instructions == Some(0) {
            return Err("--max-instructions must be at least 1".to_string());
        }
        Ok(())
    }

    /// Convert Args to EmulatorConfig
    pub fn to_emulator_config(&self) -> EmulatorConfig {
        EmulatorConfig {
            stop_pc: self.stop_pc,
            max_instructions: self.max_instructions.map(|v| v as usize),
            timeout_ms: self.timeout_ms,
            max_frames: self.frames,
        }
    }
}

pub fn parse_hex_or_dec(s: &str) -> Result<u64, std::num::ParseIntError> {
    if let Some(hex) = s.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    }
}

/// Load the BIOS and ROM images named on the command line
pub fn load_images(args: &Args) -> Result<Images, LoadError> {
    loader::read_images(&args.bios, &args.rom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_decimal() {
        assert_eq!(parse_hex_or_dec("0x080000C0"), Ok(0x0800_00C0));
        assert_eq!(parse_hex_or_dec("1234"), Ok(1234));
        assert!(parse_hex_or_dec("0xZZ").is_err());
    }

    #[test]
    fn bios_is_mandatory() {
        assert!(Args::try_parse_from(["gbaemu", "game.gba"]).is_err());
    }

    #[test]
    fn full_command_line() {
        let args = Args::try_parse_from([
            "gbaemu-cli",
            "game.gba",
            "--bios",
            "gba_bios.bin",
            "--stop-pc",
            "0x08000100",
            "-i",
            "5000",
            "--frames",
            "3",
        ])
        .unwrap();
        assert_eq!(args.validate(), Ok(()));

        let config = args.to_emulator_config();
        assert_eq!(config.stop_pc, Some(0x0800_0100));
        assert_eq!(config.max_instructions, Some(5000));
        assert_eq!(config.max_frames, Some(3));
        assert_eq!(config.timeout_ms, None);
    }

    #[test]
    fn zero_frames_is_rejected() {
        let args =
            Args::try_parse_from(["gbaemu", "game.gba", "--bios", "b.bin", "--frames", "0"])
                .unwrap();
        assert!(args.validate().is_err());
    }
}
