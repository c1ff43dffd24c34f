use std::fmt;
use std::path::{Path, PathBuf};

use super::types::{Question, QuestionRecord};

/// Spellings the catalog file turns up under once its non-ASCII name has
/// been through a zip tool or a misconfigured filesystem.
const CATALOG_PATTERN: &str = "k*simused.json";

#[derive(Debug)]
pub enum CatalogError {
    NotFound(PathBuf),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::NotFound(path) => write!(
                f,
                "could not find the question catalog '{}'; create it next to the game",
                path.display()
            ),
            CatalogError::Io { path, source } => {
                write!(f, "could not read '{}': {}", path.display(), source)
            }
            CatalogError::Parse { path, source } => {
                write!(f, "malformed question catalog '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::NotFound(_) => None,
            CatalogError::Io { source, .. } => Some(source),
            CatalogError::Parse { source, .. } => Some(source),
        }
    }
}

/// Resolve the catalog file, probing alternative spellings in the same
/// directory when the configured name does not exist.
pub fn find_catalog(path: &Path) -> Result<PathBuf, CatalogError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let pattern = if dir.as_os_str().is_empty() {
        CATALOG_PATTERN.to_string()
    } else {
        format!(
            "{}/{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            CATALOG_PATTERN
        )
    };

    let found = glob::glob(&pattern)
        .ok()
        .and_then(|paths| paths.filter_map(|p| p.ok()).find(|p| p.is_file()));

    match found {
        Some(found) => {
            log::info!("using catalog {:?} in place of {:?}", found, path);
            Ok(found)
        }
        None => Err(CatalogError::NotFound(path.to_path_buf())),
    }
}

pub fn load_catalog(path: &Path, picture_dir: &Path) -> Result<Vec<Question>, CatalogError> {
    let path = find_catalog(path)?;
    let content = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
        path: path.clone(),
        source,
    })?;
    parse_catalog(&content, picture_dir).map_err(|source| CatalogError::Parse { path, source })
}

pub fn parse_catalog(json: &str, picture_dir: &Path) -> Result<Vec<Question>, serde_json::Error> {
    let records: Vec<QuestionRecord> = serde_json::from_str(json)?;
    Ok(records
        .into_iter()
        .map(|record| Question {
            name: record.name.unwrap_or_else(|| record.id.clone()),
            image: record
                .image
                .as_deref()
                .and_then(|image| resolve_image(image, picture_dir)),
            id: record.id,
            x: record.x,
            y: record.y,
            scale: record.scale,
            text: record.question,
            code: record.code,
            choices: record.choices,
            correct: record.correct,
            letter: record.letter,
        })
        .collect())
}

/// Picture paths may be given as `arvuti.png` or `pildid/arvuti.png`.
fn resolve_image(image: &str, picture_dir: &Path) -> Option<PathBuf> {
    if image.is_empty() {
        return None;
    }
    let direct = PathBuf::from(image);
    if direct.exists() {
        return Some(direct);
    }
    let in_dir = picture_dir.join(image);
    if in_dir.exists() {
        return Some(in_dir);
    }
    log::debug!("picture {:?} not found, object stays invisible", image);
    None
}

/// The door code is every reward letter in catalog order.
pub fn door_code(questions: &[Question]) -> String {
    questions.iter().map(|q| q.letter.as_str()).collect()
}
