//! Loading the `content.xml` part of a spreadsheet export
//!
//! Two input shapes are accepted:
//! - `.ods`: the zipped OpenDocument package, `content.xml` is read from it
//! - `.xml`: a `content.xml` already extracted from a package

use crate::error::{ImportError, ImportResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Name of the spreadsheet body inside an OpenDocument package
pub const CONTENT_PART: &str = "content.xml";

/// Read the spreadsheet XML from `path`
///
/// Missing or empty files, unknown extensions and packages without a
/// `content.xml` part are fatal.
pub fn read_content_xml(path: &Path) -> ImportResult<String> {
    if !path.is_file() {
        return Err(ImportError::Fatal(format!("File not found: {}", path.display())));
    }
    if std::fs::metadata(path)?.len() == 0 {
        return Err(ImportError::Fatal(format!("File is empty: {}", path.display())));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let content = match extension.as_str() {
        "ods" => read_package_content(path)?,
        "xml" => std::fs::read_to_string(path)?,
        other => {
            return Err(ImportError::Fatal(format!(
                "Unsupported file extension '{}' (expected .ods or .xml)",
                other
            )))
        }
    };

    if content.trim().is_empty() {
        return Err(ImportError::Fatal(format!(
            "No spreadsheet content in {}",
            path.display()
        )));
    }

    Ok(content)
}

fn read_package_content(path: &Path) -> ImportResult<String> {
    let mut archive = ZipArchive::new(File::open(path)?)?;

    let mut part = match archive.by_name(CONTENT_PART) {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ImportError::Fatal(format!(
                "{} has no {} (is it an OpenDocument spreadsheet?)",
                path.display(),
                CONTENT_PART
            )))
        }
        Err(e) => return Err(e.into()),
    };

    let mut content = String::with_capacity(part.size() as usize);
    part.read_to_string(&mut content)?;
    Ok(content)
}
