//! BIOS and cartridge image loading.

use gbaemu_core::{ImageTooLarge, System};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Errors that can occur while loading images
#[derive(Debug)]
pub enum LoadError {
    /// The image file could not be read
    Io {
        image: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    /// The image file is empty
    Empty { image: &'static str, path: PathBuf },
    /// The image does not fit its memory region
    TooLarge(ImageTooLarge),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io {
                image,
                path,
                source,
            } => write!(f, "cannot read {} image {}: {}", image, path.display(), source),
            LoadError::Empty { image, path } => {
                write!(f, "{} image {} is empty", image, path.display())
            }
            LoadError::TooLarge(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::TooLarge(e) => Some(e),
            LoadError::Empty { .. } => None,
        }
    }
}

impl From<ImageTooLarge> for LoadError {
    fn from(e: ImageTooLarge) -> Self {
        LoadError::TooLarge(e)
    }
}

/// BIOS and cartridge contents as read from disk
#[derive(Debug, Clone)]
pub struct Images {
    pub bios: Vec<u8>,
    pub rom: Vec<u8>,
}

fn read_image(image: &'static str, path: &Path) -> Result<Vec<u8>, LoadError> {
    info!("Loading {} from file: {:?}", image, path);
    let data = std::fs::read(path).map_err(|source| LoadError::Io {
        image,
        path: path.to_path_buf(),
        source,
    })?;
    if data.is_empty() {
        return Err(LoadError::Empty {
            image,
            path: path.to_path_buf(),
        });
    }
    Ok(data)
}

/// Read both images. Either one missing is fatal.
pub fn read_images(bios: &Path, rom: &Path) -> Result<Images, LoadError> {
    Ok(Images {
        bios: read_image("BIOS", bios)?,
        rom: read_image("ROM", rom)?,
    })
}

/// Copy the images into the BIOS and cartridge regions
pub fn install_images(system: &mut System, bios: &[u8], rom: &[u8]) -> Result<(), LoadError> {
    let bios_region = system.bios_region();
    let cart_region = system.cart_region();
    system.memory.load_image(bios_region, 0, bios)?;
    system.memory.load_image(cart_region, 0, rom)?;
    info!(
        "Installed BIOS ({} bytes) and ROM ({} bytes)",
        bios.len(),
        rom.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbaemu_core::{SystemConfig, build_system};
    use gbaemu_hw::memory_map::{bios, cart};

    fn system() -> System {
        build_system(&SystemConfig::default()).unwrap()
    }

    #[test]
    fn images_land_at_region_bases() {
        let mut system = system();
        install_images(&mut system, &[0x12, 0x34], &[0xAB, 0xCD, 0xEF]).unwrap();

        assert_eq!(system.read(bios::BASE, 2), 0x3412);
        assert_eq!(system.read(cart::BASE, 4), 0x00EF_CDAB);
        // The cartridge mirror sees the same bytes
        assert_eq!(system.read(0x0C00_0000, 1), 0xAB);
    }

    #[test]
    fn oversized_bios_is_rejected() {
        let mut system = system();
        let bios = vec![0u8; bios::SIZE + 1];
        let err = install_images(&mut system, &bios, &[0]).unwrap_err();
        match err {
            LoadError::TooLarge(e) => {
                assert_eq!(e.region, bios::NAME);
                assert_eq!(e.len, bios::SIZE + 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = std::env::temp_dir();
        let missing = dir.join("gbaemu-loader-test-does-not-exist.bin");
        let err = read_images(&missing, &missing).unwrap_err();
        assert!(matches!(err, LoadError::Io { image: "BIOS", .. }));
        assert!(err.to_string().contains("BIOS"));
    }

    #[test]
    fn empty_rom_is_rejected() {
        let dir = std::env::temp_dir();
        let bios_path = dir.join(format!("gbaemu-loader-bios-{}.bin", std::process::id()));
        let rom_path = dir.join(format!("gbaemu-loader-rom-{}.bin", std::process::id()));
        std::fs::write(&bios_path, [0u8; 4]).unwrap();
        std::fs::write(&rom_path, [0u8; 0]).unwrap();

        let result = read_images(&bios_path, &rom_path);

        std::fs::remove_file(&bios_path).unwrap();
        std::fs::remove_file(&rom_path).unwrap();
        assert!(matches!(result, Err(LoadError::Empty { image: "ROM", .. })));
    }
}
