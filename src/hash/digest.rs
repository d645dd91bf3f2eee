// Content digest computation
// Decides file identity: two files are the same iff their digests are equal

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::Mmap;

use crate::error::SyncError;

/// Digest algorithm used to compare source and replica files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HashAlgorithm {
    /// MD5, 128 bits
    #[default]
    Md5,
    /// BLAKE3, 256 bits, multicore on large files
    Blake3,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Blake3 => "BLAKE3",
        }
    }

    fn hasher(&self) -> Box<dyn Hasher> {
        match self {
            HashAlgorithm::Md5 => Box::new(Md5Wrapper(<md5::Md5 as md5::Digest>::new())),
            HashAlgorithm::Blake3 => Box::new(Blake3Wrapper(blake3::Hasher::new())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-size fingerprint of a file's bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentDigest {
    Md5([u8; 16]),
    Blake3([u8; 32]),
}

impl ContentDigest {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ContentDigest::Md5(bytes) => bytes,
            ContentDigest::Blake3(bytes) => bytes,
        }
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in self.as_bytes() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Streaming hash state
trait Hasher: Send {
    fn update(&mut self, data: &[u8]);

    /// Large in-memory buffers; BLAKE3 spreads these across cores
    fn update_large(&mut self, data: &[u8]) {
        self.update(data);
    }

    fn finalize(self: Box<Self>) -> ContentDigest;
}

struct Md5Wrapper(md5::Md5);

impl Hasher for Md5Wrapper {
    fn update(&mut self, data: &[u8]) {
        md5::Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> ContentDigest {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&md5::Digest::finalize(self.0));
        ContentDigest::Md5(bytes)
    }
}

struct Blake3Wrapper(blake3::Hasher);

impl Hasher for Blake3Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn update_large(&mut self, data: &[u8]) {
        self.0.update_rayon(data);
    }

    fn finalize(self: Box<Self>) -> ContentDigest {
        ContentDigest::Blake3(*self.0.finalize().as_bytes())
    }
}

// Files above this size are memory mapped instead of streamed
const MMAP_THRESHOLD: u64 = 64 * 1024 * 1024; // 64MB

/// Digest computer with streaming I/O
#[derive(Debug, Clone)]
pub struct DigestComputer {
    algorithm: HashAlgorithm,
    buffer_size: usize,
}

impl DigestComputer {
    /// Create a new DigestComputer with the default buffer size (1MB)
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            buffer_size: 1024 * 1024,
        }
    }

    pub fn digest_bytes(&self, data: &[u8]) -> ContentDigest {
        let mut hasher = self.algorithm.hasher();
        hasher.update(data);
        hasher.finalize()
    }

    /// Compute the digest of a file's content
    ///
    /// Memory mapping assumes the file is not modified while it is hashed; concurrent
    /// external mutation of the trees is outside what a pass guarantees anyway.
    pub fn digest_file(&self, path: &Path) -> Result<ContentDigest, SyncError> {
        let mut file =
            File::open(path).map_err(|e| SyncError::from_io_error(e, "hashing", path))?;
        let size = file
            .metadata()
            .map_err(|e| SyncError::from_io_error(e, "hashing", path))?
            .len();

        let mut hasher = self.algorithm.hasher();

        if size > MMAP_THRESHOLD {
            match unsafe { Mmap::map(&file) } {
                Ok(mmap) => {
                    hasher.update_large(&mmap[..]);
                    return Ok(hasher.finalize());
                }
                Err(e) => {
                    tracing::debug!("mmap failed for {}, streaming instead: {}", path.display(), e);
                }
            }
        }

        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            let bytes_read = file
                .read(&mut buffer)
                .map_err(|e| SyncError::from_io_error(e, "hashing", path))?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize())
    }
}
