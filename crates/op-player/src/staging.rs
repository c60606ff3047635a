//! Host-filled staging buffers for file bytes and the filename.

use crate::LoadError;

/// Capacity of the file staging buffer.
pub const FILE_BUFFER_SIZE: usize = 0xFFFF;
/// Capacity of the filename staging buffer, NUL included.
pub const FILENAME_BUFFER_SIZE: usize = 128;

/// Fixed-capacity buffers the host writes into before calling
/// [`crate::Player::load`].
pub struct StagingBuffers {
    file: Box<[u8]>,
    filename: [u8; FILENAME_BUFFER_SIZE],
}

impl Default for StagingBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl StagingBuffers {
    pub fn new() -> Self {
        Self {
            file: vec![0; FILE_BUFFER_SIZE].into_boxed_slice(),
            filename: [0; FILENAME_BUFFER_SIZE],
        }
    }

    /// Raw file buffer for the host to fill.
    pub fn file_mut(&mut self) -> &mut [u8] {
        &mut self.file
    }

    /// The first `len` staged bytes.
    pub fn file(&self, len: usize) -> Result<&[u8], LoadError> {
        self.file.get(..len).ok_or(LoadError::TooLarge {
            len,
            capacity: FILE_BUFFER_SIZE,
        })
    }

    /// Copy `bytes` into the file buffer, returning the length to pass to load.
    pub fn stage_file(&mut self, bytes: &[u8]) -> Result<usize, LoadError> {
        let dst = self.file.get_mut(..bytes.len()).ok_or(LoadError::TooLarge {
            len: bytes.len(),
            capacity: FILE_BUFFER_SIZE,
        })?;
        dst.copy_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Raw filename buffer for the host to fill, NUL-terminated.
    pub fn filename_mut(&mut self) -> &mut [u8] {
        &mut self.filename
    }

    /// Store `name`, truncated on a character boundary to fit with its NUL.
    pub fn set_filename(&mut self, name: &str) {
        let mut end = name.len().min(FILENAME_BUFFER_SIZE - 1);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        self.filename[..end].copy_from_slice(&name.as_bytes()[..end]);
        self.filename[end] = 0;
    }

    /// Staged filename up to the first NUL. Invalid UTF-8 ends the name.
    pub fn filename(&self) -> heapless::String<FILENAME_BUFFER_SIZE> {
        let raw = match self.filename.iter().position(|&b| b == 0) {
            Some(nul) => &self.filename[..nul],
            None => &self.filename[..],
        };
        let text = match core::str::from_utf8(raw) {
            Ok(text) => text,
            Err(e) => {
                // valid_up_to is always a char boundary
                core::str::from_utf8(&raw[..e.valid_up_to()]).unwrap_or_default()
            }
        };
        let mut name = heapless::String::new();
        // cannot overflow: text is at most FILENAME_BUFFER_SIZE bytes
        let _ = name.push_str(text);
        name
    }
}
