//! Artifact sink that writes snapshots and reports into a run directory

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use undoable::{ArtifactSink, Error, HostSnapshot, ReportKind, Result, RunDir};

use crate::host::parse::OutputParser;
use crate::host::startup::{self, StartupEntry};

pub struct RunArtifacts<'a> {
    run: &'a RunDir,
    parser: &'a OutputParser,
}

impl<'a> RunArtifacts<'a> {
    pub fn new(run: &'a RunDir, parser: &'a OutputParser) -> Self {
        Self { run, parser }
    }

    fn write_startup_entries(&self, entries: &[StartupEntry]) -> Result<PathBuf> {
        let path = self
            .run
            .artifact_path(ReportKind::StartupEntries.file_name());
        let mut out = BufWriter::new(File::create(&path)?);
        startup::write_csv(&mut out, entries).map_err(Error::Io)?;
        log::debug!("Wrote {} startup entries to {}", entries.len(), path.display());
        Ok(path)
    }
}

impl ArtifactSink for RunArtifacts<'_> {
    fn write_snapshot(&mut self, snapshot: &HostSnapshot) -> Result<PathBuf> {
        self.run.write_json(snapshot.stage.file_name(), snapshot)
    }

    fn write_report(&mut self, kind: ReportKind) -> Result<PathBuf> {
        match kind {
            ReportKind::StartupEntries => {
                let entries = startup::collect(self.parser);
                self.write_startup_entries(&entries)
            }
        }
    }
}
