//! Executable header inspection.
//!
//! Reads just enough of an ELF, Mach-O or PE file to name the machine it
//! was built for, using the same marker strings as [`Arch::marker`].
//!
//! [`Arch::marker`]: crate::toolchain::Arch::marker

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CompileProbeError;

/// Container format of an inspected binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinaryFormat {
    Elf,
    MachO,
    Pe,
}

/// What the header says about a binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryInfo {
    pub format: BinaryFormat,
    /// Architecture marker (`AArch64`, `X86-64`, ...).
    pub marker: &'static str,
}

/// Enough bytes for every header field read below, including a PE header
/// at a typical `e_lfanew` offset.
const HEADER_LIMIT: u64 = 4096;

/// Inspect the file at `path`.
pub fn inspect_file(path: &Path) -> Result<BinaryInfo, CompileProbeError> {
    let file = File::open(path).map_err(|e| {
        CompileProbeError::Inspect(format!("cannot open {}: {}", path.display(), e))
    })?;
    let mut bytes = Vec::new();
    file.take(HEADER_LIMIT)
        .read_to_end(&mut bytes)
        .map_err(|e| CompileProbeError::Inspect(format!("cannot read {}: {}", path.display(), e)))?;
    inspect_bytes(&bytes)
}

/// Inspect a binary's leading bytes.
pub fn inspect_bytes(bytes: &[u8]) -> Result<BinaryInfo, CompileProbeError> {
    if bytes.starts_with(b"\x7fELF") {
        return elf(bytes);
    }
    if bytes.starts_with(b"MZ") {
        return pe(bytes);
    }
    if let Some(info) = macho(bytes)? {
        return Ok(info);
    }
    Err(CompileProbeError::Inspect(
        "not an ELF, Mach-O or PE binary".to_string(),
    ))
}

fn too_short(format: &str) -> CompileProbeError {
    CompileProbeError::Inspect(format!("truncated {} header", format))
}

fn u16_at(bytes: &[u8], offset: usize, little: bool) -> Option<u16> {
    let b: [u8; 2] = bytes.get(offset..offset + 2)?.try_into().ok()?;
    Some(if little {
        u16::from_le_bytes(b)
    } else {
        u16::from_be_bytes(b)
    })
}

fn u32_at(bytes: &[u8], offset: usize, little: bool) -> Option<u32> {
    let b: [u8; 4] = bytes.get(offset..offset + 4)?.try_into().ok()?;
    Some(if little {
        u32::from_le_bytes(b)
    } else {
        u32::from_be_bytes(b)
    })
}

fn elf(bytes: &[u8]) -> Result<BinaryInfo, CompileProbeError> {
    // EI_DATA: 1 = little endian, 2 = big endian.
    let little = match bytes.get(5) {
        Some(1) => true,
        Some(2) => false,
        _ => return Err(CompileProbeError::Inspect("bad ELF data encoding".to_string())),
    };
    let machine = u16_at(bytes, 18, little).ok_or_else(|| too_short("ELF"))?;

    let marker = match machine {
        3 => "Intel 80386",
        8 => "MIPS",
        21 => "PowerPC64",
        40 => "ARM",
        62 => "X86-64",
        183 => "AArch64",
        243 => "RISC-V",
        other => {
            return Err(CompileProbeError::Inspect(format!(
                "unknown ELF machine {}",
                other
            )))
        }
    };
    Ok(BinaryInfo {
        format: BinaryFormat::Elf,
        marker,
    })
}

const CPU_ARCH_ABI64: u32 = 0x0100_0000;

fn macho(bytes: &[u8]) -> Result<Option<BinaryInfo>, CompileProbeError> {
    let little = match bytes.get(..4) {
        Some([0xce, 0xfa, 0xed, 0xfe]) | Some([0xcf, 0xfa, 0xed, 0xfe]) => true,
        Some([0xfe, 0xed, 0xfa, 0xce]) | Some([0xfe, 0xed, 0xfa, 0xcf]) => false,
        _ => return Ok(None),
    };
    let cputype = u32_at(bytes, 4, little).ok_or_else(|| too_short("Mach-O"))?;

    let marker = match cputype {
        7 => "Intel 80386",
        12 => "ARM",
        t if t == (7 | CPU_ARCH_ABI64) => "X86-64",
        t if t == (12 | CPU_ARCH_ABI64) => "AArch64",
        t if t == (18 | CPU_ARCH_ABI64) => "PowerPC64",
        other => {
            return Err(CompileProbeError::Inspect(format!(
                "unknown Mach-O cputype {:#x}",
                other
            )))
        }
    };
    Ok(Some(BinaryInfo {
        format: BinaryFormat::MachO,
        marker,
    }))
}

fn pe(bytes: &[u8]) -> Result<BinaryInfo, CompileProbeError> {
    let offset = u32_at(bytes, 0x3c, true).ok_or_else(|| too_short("PE"))? as usize;
    if bytes.get(offset..offset + 4) != Some(b"PE\0\0".as_slice()) {
        return Err(CompileProbeError::Inspect("missing PE signature".to_string()));
    }
    let machine = u16_at(bytes, offset + 4, true).ok_or_else(|| too_short("PE"))?;

    let marker = match machine {
        0x014c => "Intel 80386",
        0x01c4 => "ARM",
        0x8664 => "X86-64",
        0xaa64 => "AArch64",
        0x5064 => "RISC-V",
        other => {
            return Err(CompileProbeError::Inspect(format!(
                "unknown PE machine {:#x}",
                other
            )))
        }
    };
    Ok(BinaryInfo {
        format: BinaryFormat::Pe,
        marker,
    })
}

/// Minimal ELF header bytes for tests.
#[cfg(test)]
pub(crate) fn elf_header(machine: u16) -> Vec<u8> {
    let mut bytes = vec![0u8; 64];
    bytes[..4].copy_from_slice(b"\x7fELF");
    bytes[4] = 2; // ELFCLASS64
    bytes[5] = 1; // little endian
    bytes[6] = 1;
    bytes[16..18].copy_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    bytes[18..20].copy_from_slice(&machine.to_le_bytes());
    bytes
}
