use std::path::{Path, PathBuf};
use rayon::prelude::*;
use crate::errors::ParseError;
use crate::label::BuildLabel;
use crate::parser::{parse_file, Package, ParseOptions};

/// Result of parsing one top-level file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub result: Result<Package, ParseError>,
}

impl FileReport {
    pub fn deferred_label(&self) -> Option<&BuildLabel> {
        self.result.as_ref().err().and_then(ParseError::deferred_label)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.result, Err(ParseError::Stack(_)))
    }
}

/// Parses every file in parallel. Reports come back in input order; each
/// parse owns its own diagnostics.
pub fn parse_files<P>(paths: &[P], options: &ParseOptions) -> Vec<FileReport>
where
    P: AsRef<Path> + Sync,
{
    tracing::info!("parsing {} file(s)", paths.len());
    paths
        .par_iter()
        .map(|path| {
            let path = path.as_ref();
            let result = parse_file(path, options);
            match &result {
                Ok(package) => tracing::debug!("{}: {} rule(s)", path.display(), package.rules.len()),
                Err(ParseError::Deferred(d)) => tracing::info!("{}: deferred on {}", path.display(), d.label),
                Err(ParseError::Stack(stack)) => tracing::debug!("{}: {}", path.display(), stack.short_error()),
            }
            FileReport {
                path: path.to_path_buf(),
                result,
            }
        })
        .collect()
}

/// Labels that must be built before the deferred files can be parsed again,
/// without duplicates, in first-seen order.
pub fn pending_labels(reports: &[FileReport]) -> Vec<BuildLabel> {
    let mut labels: Vec<BuildLabel> = Vec::new();
    for label in reports.iter().filter_map(FileReport::deferred_label) {
        if !labels.contains(label) {
            labels.push(label.clone());
        }
    }
    labels
}
