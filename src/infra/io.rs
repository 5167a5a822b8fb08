use memmap2::Mmap;
use std::fs::{self, File};
use std::io;
use std::path::Path;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

/// File bytes, memory-mapped when large.
pub enum FileContent {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl FileContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Mapped(mmap) => &mmap[..],
            FileContent::Buffered(buf) => buf.as_slice(),
        }
    }

    /// The content as text, `None` when it is not valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }
}

pub fn read_file_smart<P: AsRef<Path>>(path: P) -> io::Result<FileContent> {
    let path = path.as_ref();
    let metadata = fs::metadata(path)?;

    if metadata.len() > MMAP_THRESHOLD {
        let file = File::open(path)?;

        // Safety: read-only map; the source tree is not modified during a build
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(FileContent::Mapped(mmap))
    } else {
        Ok(FileContent::Buffered(fs::read(path)?))
    }
}

/// Write `contents` to `path`, creating parent directories as needed.
pub fn write_output<P: AsRef<Path>>(path: P, contents: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

/// Copy `from` to `to`, creating parent directories as needed.
pub fn copy_file<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> io::Result<u64> {
    let to = to.as_ref();
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)
}

/// Remove a directory tree; a missing directory is not an error.
pub fn remove_dir_if_exists<P: AsRef<Path>>(path: P) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
