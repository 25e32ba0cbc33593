use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{CrackError, Result};
use crate::verifier::{Verdict, Verifier, VerifyError};

type Archive = ZipArchive<Cursor<Arc<[u8]>>>;

/// Tests passwords against one entry of an in-memory ZIP archive.
///
/// The central directory is parsed once; every attempt clones the parsed
/// archive, which only bumps reference counts, so workers never contend on
/// a shared reader.
pub struct ZipVerifier {
    archive: Archive,
    entry: usize,
    encrypted: bool,
}

impl ZipVerifier {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Self::from_bytes(bytes)
    }

    /// Parses an archive and picks the entry to test: the first non-empty
    /// encrypted file, else the first encrypted file, else the first file.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes.into()))
            .map_err(|e| CrackError::ArchiveUnreadable(e.to_string()))?;

        let mut first_file = None;
        let mut first_encrypted = None;
        let mut first_sized = None;
        for index in 0..archive.len() {
            let (is_dir, size) = {
                let file = archive
                    .by_index_raw(index)
                    .map_err(|e| CrackError::ArchiveUnreadable(e.to_string()))?;
                (file.is_dir(), file.size())
            };
            if is_dir {
                continue;
            }
            let encrypted = match archive.by_index(index) {
                Ok(_) => false,
                Err(ZipError::UnsupportedArchive(msg)) if msg == ZipError::PASSWORD_REQUIRED => true,
                Err(e) => {
                    debug!("Skipping entry #{index}: {e}");
                    continue;
                }
            };
            first_file.get_or_insert(index);
            if encrypted {
                first_encrypted.get_or_insert(index);
                // An empty entry has no data to expose a header collision.
                if size > 0 && first_sized.is_none() {
                    first_sized = Some(index);
                }
            }
        }

        let entry = first_sized
            .or(first_encrypted)
            .or(first_file)
            .ok_or_else(|| CrackError::ArchiveUnreadable("archive contains no files".to_string()))?;
        debug!("Testing passwords against entry #{entry}");

        Ok(ZipVerifier {
            archive,
            entry,
            encrypted: first_encrypted.is_some(),
        })
    }

    pub fn entry_name(&self) -> Option<String> {
        let mut archive = self.archive.clone();
        let name = archive.by_index_raw(self.entry).ok()?.name().to_string();
        Some(name)
    }
}

impl Verifier for ZipVerifier {
    fn attempt(&self, candidate: &str) -> std::result::Result<Verdict, VerifyError> {
        let mut archive = self.archive.clone();
        let mut file = match archive.by_index_decrypt(self.entry, candidate.as_bytes()) {
            Ok(Ok(file)) => file,
            Ok(Err(_)) => return Err(VerifyError::WrongPassword),
            Err(ZipError::InvalidArchive(msg)) => return Err(VerifyError::Corrupt(msg.to_string())),
            Err(e) => return Err(VerifyError::Unreadable(e.to_string())),
        };

        // The ZipCrypto header check passes for roughly 1 in 256 wrong
        // passwords; only a full decompression with a valid checksum counts.
        match io::copy(&mut file, &mut io::sink()) {
            Ok(_) => Ok(Verdict::Matched),
            Err(_) => Ok(Verdict::NotMatched),
        }
    }

    fn requires_password(&self) -> std::result::Result<bool, VerifyError> {
        Ok(self.encrypted)
    }
}
