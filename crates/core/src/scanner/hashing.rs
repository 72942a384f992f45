use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use md5::{Digest, Md5};

use crate::error::Result;

/// Content facts gathered in one pass over a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHashes {
    /// Lowercase hex MD5, the form the catalog's hash columns hold.
    pub md5: String,
    pub size: u64,
}

pub fn calculate_hashes(path: &Path) -> Result<FileHashes> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut md5_hasher = Md5::new();
    let mut size = 0u64;

    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        md5_hasher.update(&buffer[..bytes_read]);
        size += bytes_read as u64;
    }

    Ok(FileHashes {
        md5: format!("{:x}", md5_hasher.finalize()),
        size,
    })
}
