//! Built-in openers. The format-specific ones check the file signature and
//! hand back the file rewound to the start; decoding is left to the caller.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

const HDF5_SIGNATURE: &[u8] = b"\x89HDF\r\n\x1a\n";
const BZ2_SIGNATURE: &[u8] = b"BZh";
const GZIP_SIGNATURE: &[u8] = &[0x1f, 0x8b];

pub fn open_plain(path: &Path) -> io::Result<File> {
    File::open(path)
}

pub fn open_hdf5(path: &Path) -> io::Result<File> {
    open_with_signature(path, HDF5_SIGNATURE, "HDF5")
}

pub fn open_bz2(path: &Path) -> io::Result<File> {
    open_with_signature(path, BZ2_SIGNATURE, "bzip2")
}

pub fn open_gzip(path: &Path) -> io::Result<File> {
    open_with_signature(path, GZIP_SIGNATURE, "gzip")
}

fn open_with_signature(path: &Path, signature: &[u8], format: &str) -> io::Result<File> {
    let mut file = File::open(path)?;
    let mut head = vec![0u8; signature.len()];
    let matches = match file.read_exact(&mut head) {
        Ok(()) => head == signature,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => false,
        Err(e) => return Err(e),
    };
    if !matches {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is not a {} file", path.display(), format),
        ));
    }
    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}
