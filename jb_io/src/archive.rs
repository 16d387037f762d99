use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Zip local-file-header / empty-archive magic.
const ZIP_MAGIC: [u8; 2] = [b'P', b'K'];

/// Returns true iff the first two bytes of the file are the zip-family
/// signature. Directories, missing paths, and unreadable files all report
/// false; detection errors are never propagated.
pub fn is_archive(path: &Path) -> bool {
    if path.is_dir() {
        return false;
    }

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return false,
    };

    let mut magic = [0u8; 2];
    match file.read_exact(&mut magic) {
        Ok(()) => magic == ZIP_MAGIC,
        Err(_) => false,
    }
}
