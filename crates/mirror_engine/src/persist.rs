use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("{} exists and is not a directory", path.display())]
    NotADirectory { path: PathBuf },
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Creates `dir` and its parents unless it is already a directory.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(_) => fs::create_dir_all(dir).map_err(|source| PersistError::CreateDir {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Mode new files are created with, before the process umask.
#[cfg(unix)]
const CREATE_MODE: u32 = 0o666;

/// Writes `{dir}/{filename}` through a temp file in the same directory and a
/// rename, so readers (the file server, the site generator) never see a
/// half-written document or image.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;
        let target = self.dir.join(filename);
        self.replace(&target, content)
            .map_err(|source| PersistError::Write {
                path: target.clone(),
                source,
            })?;
        Ok(target)
    }

    fn replace(&self, target: &Path, content: &[u8]) -> io::Result<()> {
        let mut staged = staging_builder().tempfile_in(&self.dir)?;
        staged.write_all(content)?;
        staged.as_file().sync_all()?;
        staged.persist(target).map_err(|err| err.error)?;
        Ok(())
    }
}

/// Staged files are opened with [`CREATE_MODE`] so the umask applies, as it
/// does for a plain `File::create`. tempfile's own default is owner-only.
#[cfg(unix)]
fn staging_builder() -> tempfile::Builder<'static, 'static> {
    use std::os::unix::fs::PermissionsExt;
    let mut builder = tempfile::Builder::new();
    builder.permissions(fs::Permissions::from_mode(CREATE_MODE));
    builder
}

#[cfg(not(unix))]
fn staging_builder() -> tempfile::Builder<'static, 'static> {
    tempfile::Builder::new()
}
