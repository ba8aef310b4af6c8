//! Assemble a batch of classes and publish their class files
//!
//! Each class is assembled fully in memory first. A class file is only written to disk once its
//! class assembled without a fatal error, so a failing class never leaves a partial file behind.
//! Failures are collected and the batch moves on to the next class.

use crate::jvm::class_file::ClassModel;
use crate::jvm::{Diagnostic, Diagnostics, Error, IgnoreWarnings, Reporter};
use std::fs;
use std::path::{Path, PathBuf};

pub struct Settings {
    /// Directory under which `<binary name>.class` files are written
    pub output_directory: PathBuf,

    /// Create the package directories of the output files if they don't exist
    pub create_missing_directories: bool,

    /// Assemble everything but don't write any files
    pub no_write: bool,

    /// Drop warnings instead of reporting them
    pub no_warn: bool,

    /// Treat a class with warnings as failed
    pub strict: bool,
}

impl Settings {
    pub fn new(output_directory: impl Into<PathBuf>) -> Settings {
        Settings {
            output_directory: output_directory.into(),
            create_missing_directories: true,
            no_write: false,
            no_warn: false,
            strict: false,
        }
    }
}

/// Class to assemble, along with the name of the source it came from (for diagnostics)
pub struct Job {
    pub source: String,
    pub class: ClassModel,
}

/// Why a class didn't make it to disk
#[derive(Debug)]
pub enum Failure {
    /// Fatal error while assembling or writing the class
    Error(Error),

    /// Warnings reported in strict mode
    Warnings(Vec<Diagnostic>),
}

#[derive(Default, Debug)]
pub struct BatchOutcome {
    /// Class files written (or that would have been, with `no_write`)
    pub written: Vec<PathBuf>,

    /// Sources which failed, in the order they were processed
    pub failed: Vec<(String, Failure)>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Assemble a class into an in-memory buffer
///
/// Warnings are accumulated into `diagnostics` unless the settings say to drop them.
pub fn assemble_to_bytes(
    class: &mut ClassModel,
    settings: &Settings,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<u8>, Error> {
    let mut ignore = IgnoreWarnings;
    let reporter: &mut dyn Reporter = if settings.no_warn {
        &mut ignore
    } else {
        diagnostics
    };
    let mut bytes: Vec<u8> = vec![];
    class.assemble(reporter, &mut bytes)?;
    Ok(bytes)
}

/// Assemble every class in turn, writing out those which succeed
pub fn assemble_all(jobs: Vec<Job>, settings: &Settings) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for Job { source, mut class } in jobs {
        log::info!("Assembling '{}'", source);
        let mut diagnostics = Diagnostics::new();
        let result = assemble_to_bytes(&mut class, settings, &mut diagnostics);

        let bytes = match result {
            Ok(_) if settings.strict && !diagnostics.is_empty() => {
                log::error!("Dropping '{}': warnings in strict mode", source);
                let warnings = diagnostics.warnings().to_vec();
                diagnostics.report(&source);
                outcome.failed.push((source, Failure::Warnings(warnings)));
                continue;
            }
            Ok(bytes) => bytes,
            Err(err) => {
                log::error!("Dropping '{}': {} {:?}", source, err.id(), err.args());
                diagnostics.report(&source);
                outcome.failed.push((source, Failure::Error(err)));
                continue;
            }
        };
        diagnostics.report(&source);

        let path = match class.binary_name() {
            Some(name) => settings.output_directory.join(format!("{}.class", name)),
            None => {
                let err = Error::UnresolvedConstant(class.this_class);
                outcome.failed.push((source, Failure::Error(err)));
                continue;
            }
        };
        if !settings.no_write {
            log::info!("Writing '{}'", path.display());
            if let Err(err) = save_to_path(&path, &bytes, settings.create_missing_directories) {
                log::error!("Could not write '{}': {}", path.display(), err);
                outcome.failed.push((source, Failure::Error(Error::IoError(err))));
                continue;
            }
        }
        outcome.written.push(path);
    }
    outcome
}

/// Save a class file to disk
pub fn save_to_path<P: AsRef<Path>>(
    path: P,
    bytes: &[u8],
    create_missing_directories: bool,
) -> std::io::Result<()> {
    let path = path.as_ref();
    if create_missing_directories {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)
}
