//! Exclusive lock on the key file
//!
//! Serializes read-modify-write cycles on `keys.json` across threads and
//! processes: `flock` on Unix, `LockFileEx` on Windows. The lock lives on a
//! sidecar file so the key file itself can be replaced by rename while held.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{FieldSealError, FieldSealResult};

/// An open handle on a lock file
///
/// Each handle is its own open file description, so two handles on the same
/// path exclude each other even inside one process.
#[derive(Debug)]
pub struct KeyFileLock {
    file: File,
    path: PathBuf,
}

/// Holds the exclusive lock until dropped
#[derive(Debug)]
pub struct KeyFileLockGuard<'a> {
    lock: &'a KeyFileLock,
}

impl KeyFileLock {
    /// Open or create the lock file at `path`
    pub fn open(path: &Path) -> FieldSealResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| lock_error(path, &e))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| lock_error(path, &e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Block until the exclusive lock is held
    pub fn lock(&self) -> FieldSealResult<KeyFileLockGuard<'_>> {
        lock_exclusive(&self.file).map_err(|e| lock_error(&self.path, &e))?;
        Ok(KeyFileLockGuard { lock: self })
    }

    /// Take the lock if nobody else holds it
    pub fn try_lock(&self) -> FieldSealResult<Option<KeyFileLockGuard<'_>>> {
        if try_lock_exclusive(&self.file).map_err(|e| lock_error(&self.path, &e))? {
            Ok(Some(KeyFileLockGuard { lock: self }))
        } else {
            Ok(None)
        }
    }
}

impl Drop for KeyFileLockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = unlock(&self.lock.file) {
            tracing::warn!(
                path = %self.lock.path.display(),
                error = %e,
                "failed to release key file lock"
            );
        }
    }
}

/// Sidecar lock path for a key file (`keys.json` -> `keys.json.lock`)
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn lock_error(path: &Path, err: &std::io::Error) -> FieldSealError {
    FieldSealError::Storage(format!("Failed to lock {}: {}", path.display(), err))
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> std::io::Result<()> {
    let fd = std::os::unix::io::AsRawFd::as_raw_fd(file);
    loop {
        let result = unsafe { flock(fd, LOCK_EX) };
        if result == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> std::io::Result<bool> {
    let fd = std::os::unix::io::AsRawFd::as_raw_fd(file);
    let result = unsafe { flock(fd, LOCK_EX | LOCK_NB) };
    if result == 0 {
        Ok(true)
    } else {
        let err = std::io::Error::last_os_error();
        if err.kind() == std::io::ErrorKind::WouldBlock {
            Ok(false)
        } else {
            Err(err)
        }
    }
}

#[cfg(unix)]
fn unlock(file: &File) -> std::io::Result<()> {
    let fd = std::os::unix::io::AsRawFd::as_raw_fd(file);
    let result = unsafe { flock(fd, LOCK_UN) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(unix)]
use std::os::raw::c_int;

#[cfg(unix)]
const LOCK_EX: c_int = 2;
#[cfg(unix)]
const LOCK_NB: c_int = 4;
#[cfg(unix)]
const LOCK_UN: c_int = 8;

#[cfg(unix)]
extern "C" {
    fn flock(fd: c_int, operation: c_int) -> c_int;
}

#[cfg(windows)]
fn lock_exclusive(file: &File) -> std::io::Result<()> {
    lock_file(file, 0)
}

#[cfg(windows)]
fn try_lock_exclusive(file: &File) -> std::io::Result<bool> {
    match lock_file(file, LOCKFILE_FAIL_IMMEDIATELY) {
        Ok(()) => Ok(true),
        Err(err) if err.raw_os_error() == Some(ERROR_LOCK_VIOLATION) => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(windows)]
fn unlock(file: &File) -> std::io::Result<()> {
    let handle = std::os::windows::io::AsRawHandle::as_raw_handle(file) as HANDLE;
    let mut overlapped: OVERLAPPED = unsafe { std::mem::zeroed() };
    let result = unsafe { UnlockFileEx(handle, 0, 1, 0, &mut overlapped) };
    if result != 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(windows)]
fn lock_file(file: &File, flags: u32) -> std::io::Result<()> {
    let handle = std::os::windows::io::AsRawHandle::as_raw_handle(file) as HANDLE;
    let mut overlapped: OVERLAPPED = unsafe { std::mem::zeroed() };
    let result = unsafe {
        LockFileEx(
            handle,
            LOCKFILE_EXCLUSIVE_LOCK | flags,
            0,
            1,
            0,
            &mut overlapped,
        )
    };
    if result != 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(windows)]
type HANDLE = *mut std::ffi::c_void;

#[cfg(windows)]
#[repr(C)]
struct OVERLAPPED {
    internal: usize,
    internal_high: usize,
    offset: u32,
    offset_high: u32,
    h_event: HANDLE,
}

#[cfg(windows)]
const LOCKFILE_EXCLUSIVE_LOCK: u32 = 0x2;
#[cfg(windows)]
const LOCKFILE_FAIL_IMMEDIATELY: u32 = 0x1;
#[cfg(windows)]
const ERROR_LOCK_VIOLATION: i32 = 33;

#[cfg(windows)]
extern "system" {
    fn LockFileEx(
        h_file: HANDLE,
        flags: u32,
        reserved: u32,
        bytes_to_lock_low: u32,
        bytes_to_lock_high: u32,
        overlapped: *mut OVERLAPPED,
    ) -> i32;
    fn UnlockFileEx(
        h_file: HANDLE,
        reserved: u32,
        bytes_to_unlock_low: u32,
        bytes_to_unlock_high: u32,
        overlapped: *mut OVERLAPPED,
    ) -> i32;
}
