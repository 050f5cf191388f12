use crate::error::IngestError;
use crate::extractor::SUPPORTED_EXTENSIONS;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

/// Recursively discover ingestable documents under `folder`, sorted for
/// deterministic ordering.
pub fn discover_documents(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let supported = entry
            .path()
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|candidate| extension.eq_ignore_ascii_case(candidate))
            });

        if supported {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Logical source identifier of a document: its file name.
pub fn source_basename(path: &Path) -> Result<String, IngestError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })
}

/// Globally unique record id for one chunk of one ingestion run. The
/// random suffix makes ids from repeated ingestions of the same source
/// distinct, so stale records from a prior run are not overwritten unless
/// the caller clears them first.
pub fn make_record_id(source_id: &str, chunk_index: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{source_id}_chunk_{chunk_index}_{}", &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::{discover_documents, make_record_id, source_basename};
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn discovery_is_recursive_and_filters_extensions(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        File::create(base.join("a.txt")).and_then(|mut file| file.write_all(b"text"))?;
        File::create(nested.join("b.md")).and_then(|mut file| file.write_all(b"md"))?;
        File::create(nested.join("c.PDF"))
            .and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(base.join("skip.docx")).and_then(|mut file| file.write_all(b"nope"))?;

        let files = discover_documents(base);
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|path| path
            .extension()
            .is_some_and(|extension| !extension.eq_ignore_ascii_case("docx"))));
        Ok(())
    }

    #[test]
    fn source_basename_is_the_file_name() {
        let name = source_basename(Path::new("/srv/docs/leave_doc.txt")).expect("has name");
        assert_eq!(name, "leave_doc.txt");
    }

    #[test]
    fn record_ids_embed_source_and_index_with_random_suffix() {
        let first = make_record_id("leave_doc.txt", 3);
        let second = make_record_id("leave_doc.txt", 3);

        assert!(first.starts_with("leave_doc.txt_chunk_3_"));
        assert!(second.starts_with("leave_doc.txt_chunk_3_"));
        assert_ne!(first, second);
        assert_eq!(first.len(), "leave_doc.txt_chunk_3_".len() + 8);
    }
}
