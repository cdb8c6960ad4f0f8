//! Fixed on-disk geometry: footer layout and block capacity.

use crate::TableError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};

/// Magic identifying an EmberKV table, "EST1".
pub const TABLE_MAGIC: u32 = 0x4553_5431;

/// Footer size in bytes: filter_offset(8) + index_offset(8) +
/// entry_count(4) + magic(4).
pub const FOOTER_LEN: u64 = 24;

/// Maximum entries per data block. The final block may be shorter.
pub const BLOCK_CAP: usize = 64;

/// The fixed trailer of a table file. Written last, read first.
///
/// The offsets must satisfy
/// `0 <= filter_offset <= index_offset <= file_size - FOOTER_LEN`;
/// `filter_offset == index_offset` means the filter region is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub filter_offset: u64,
    pub index_offset: u64,
    pub entry_count: u32,
}

impl Footer {
    /// Serializes the footer, magic last.
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_u64::<LittleEndian>(self.filter_offset)?;
        w.write_u64::<LittleEndian>(self.index_offset)?;
        w.write_u32::<LittleEndian>(self.entry_count)?;
        w.write_u32::<LittleEndian>(TABLE_MAGIC)?;
        Ok(())
    }

    /// Reads and validates the footer from the tail of `r`.
    ///
    /// Returns the footer together with the file size (the caller needs it
    /// to bound the index region).
    ///
    /// # Errors
    ///
    /// [`TableError::Corruption`] if the file is shorter than a footer, the
    /// magic does not match, or the offsets are inconsistent.
    pub fn read_from<R: Read + Seek>(r: &mut R) -> Result<(Self, u64), TableError> {
        let file_size = r.seek(SeekFrom::End(0))?;
        if file_size < FOOTER_LEN {
            return Err(TableError::Corruption(format!(
                "file too small for a footer: {file_size} bytes"
            )));
        }

        r.seek(SeekFrom::Start(file_size - FOOTER_LEN))?;
        let filter_offset = r.read_u64::<LittleEndian>()?;
        let index_offset = r.read_u64::<LittleEndian>()?;
        let entry_count = r.read_u32::<LittleEndian>()?;
        let magic = r.read_u32::<LittleEndian>()?;

        if magic != TABLE_MAGIC {
            return Err(TableError::Corruption(format!(
                "bad magic: expected {TABLE_MAGIC:#010x}, got {magic:#010x}"
            )));
        }
        if filter_offset > index_offset || index_offset > file_size - FOOTER_LEN {
            return Err(TableError::Corruption(format!(
                "inconsistent footer offsets: filter={filter_offset} index={index_offset} \
                 file_size={file_size}"
            )));
        }

        Ok((
            Self {
                filter_offset,
                index_offset,
                entry_count,
            },
            file_size,
        ))
    }
}
