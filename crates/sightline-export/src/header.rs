//! Export file header literal.

use std::io::Read;

use crate::errors::{ExportError, Result};

/// Byte width of the header literal.
pub const FILE_HEADER_LEN: usize = 16;

/// Literal opening every v1 export file: 12 characters plus 4 trailing
/// spaces, no terminator.
pub const FILE_HEADER: [u8; FILE_HEADER_LEN] = *b"EK Export v1    ";

/// Read exactly the header's width from `input` and check the literal.
pub(crate) fn read_and_verify(input: &mut impl Read) -> Result<()> {
    let mut found = [0u8; FILE_HEADER_LEN];
    input.read_exact(&mut found)?;

    if found != FILE_HEADER {
        return Err(ExportError::HeaderMismatch { found });
    }

    Ok(())
}
