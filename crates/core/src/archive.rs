use crate::error::{ArchiveError, PipelineError};
use crate::models::{extension_of, is_supported_document_name, Document, ARCHIVE_EXTENSION};
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

/// Maximum depth of archives nested inside archives.
pub const MAX_NESTING_DEPTH: usize = 10;

/// Flattens the selected files into analyzable documents. Archives are opened and
/// replaced by their supported entries, supported documents pass through, anything
/// else is dropped. Output order follows input order, then entry order.
pub async fn expand_inputs(files: Vec<Document>) -> Result<Vec<Document>, PipelineError> {
    let mut documents = Vec::new();

    for file in files {
        if file.is_archive() {
            let name = file.name.clone();
            let entries = expand_archive(&file)
                .await
                .map_err(|source| PipelineError::Archive { file: name.clone(), source })?;
            debug!(archive = %name, documents = entries.len(), "expanded archive");
            documents.extend(entries);
        } else if file.is_supported_document() {
            documents.push(file);
        } else {
            debug!(file = %file.name, "dropping unsupported file");
        }
    }

    Ok(documents)
}

pub async fn expand_archive(archive: &Document) -> Result<Vec<Document>, ArchiveError> {
    let bytes = archive.bytes.clone();
    tokio::task::spawn_blocking(move || read_archive(&bytes, 1))
        .await
        .map_err(|error| ArchiveError::Task(error.to_string()))?
}

fn read_archive(bytes: &[u8], depth: usize) -> Result<Vec<Document>, ArchiveError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ArchiveError::TooDeep(MAX_NESTING_DEPTH));
    }

    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut documents = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let nested = extension_of(&name).as_deref() == Some(ARCHIVE_EXTENSION);
        if !nested && !is_supported_document_name(&name) {
            continue;
        }

        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|error| ArchiveError::Entry {
                name: name.clone(),
                details: error.to_string(),
            })?;

        if nested {
            documents.extend(read_archive(&contents, depth + 1)?);
        } else {
            documents.push(Document::new(name, "", contents));
        }
    }

    Ok(documents)
}
