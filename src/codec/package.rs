/*!
 * OPC package access: the ZIP container shared by `.xlsx` and `.pptx`.
 *
 * Parts are read fully into memory in archive order. Writing goes to a
 * temporary file next to the destination which is renamed into place once
 * the archive is complete, so a failed save never leaves a truncated file.
 */

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use log::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::xml::XmlElement;
use crate::errors::CodecError;

/// Maximum number of entries accepted in a package
pub const MAX_PART_COUNT: usize = 10_000;

/// Maximum decompressed size of a single part
pub const MAX_PART_SIZE: u64 = 256 * 1024 * 1024;

/// Relationship type suffix of the main document part
pub const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// A named part of a package
#[derive(Debug, Clone)]
pub struct PackagePart {
    pub name: String,
    pub data: Vec<u8>,
}

/// A relationship from one part to another
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Target resolved to a package part name
    pub target: String,
    pub external: bool,
}

/// An in-memory OPC package
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<PackagePart>,
}

/// Reject entry names that could escape the package root
fn validate_part_name(name: &str) -> Result<(), CodecError> {
    if name.is_empty() {
        return Err(CodecError::Malformed("empty part name".to_string()));
    }
    if name.starts_with('/') || name.starts_with('\\') || name.contains(':') {
        return Err(CodecError::Malformed(format!("absolute part name: {}", name)));
    }
    if name.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(CodecError::Malformed(format!("part name escapes package: {}", name)));
    }
    Ok(())
}

/// Resolve a relationship target against the part that owns the relationship
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Name of the relationships part for a source part (`""` for the package)
pub fn relationships_part(source_part: &str) -> String {
    match source_part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if source_part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", source_part),
    }
}

impl Package {
    /// Open a package file
    pub fn open(path: &Path) -> Result<Self, CodecError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Read every part of a package into memory
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, CodecError> {
        let mut archive = ZipArchive::new(reader)?;

        if archive.len() > MAX_PART_COUNT {
            return Err(CodecError::Limit(format!(
                "package contains {} entries (max: {})",
                archive.len(),
                MAX_PART_COUNT
            )));
        }

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            validate_part_name(&name)?;

            if file.size() > MAX_PART_SIZE {
                return Err(CodecError::Limit(format!(
                    "part '{}' is {} bytes (max: {})",
                    name,
                    file.size(),
                    MAX_PART_SIZE
                )));
            }

            let mut data = Vec::with_capacity(file.size() as usize);
            file.take(MAX_PART_SIZE + 1).read_to_end(&mut data)?;
            if data.len() as u64 > MAX_PART_SIZE {
                return Err(CodecError::Limit(format!(
                    "part '{}' exceeds {} bytes when decompressed",
                    name, MAX_PART_SIZE
                )));
            }

            parts.push(PackagePart { name, data });
        }

        debug!("Read package with {} parts", parts.len());
        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Add a part, replacing any existing part of the same name
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(PackagePart { name, data }),
        }
    }

    /// Parse a part as XML
    pub fn xml(&self, name: &str) -> Result<XmlElement, CodecError> {
        let data = self
            .part(name)
            .ok_or_else(|| CodecError::MissingPart(name.to_string()))?;
        XmlElement::parse(data, name)
    }

    /// Relationships owned by a part (`""` for package-level relationships)
    pub fn relationships(&self, source_part: &str) -> Result<Vec<Relationship>, CodecError> {
        let rels_name = relationships_part(source_part);
        let Some(data) = self.part(&rels_name) else {
            return Ok(Vec::new());
        };
        let root = XmlElement::parse(data, &rels_name)?;

        Ok(root
            .find_all("Relationship")
            .filter_map(|rel| {
                let id = rel.attribute("Id")?.to_string();
                let rel_type = rel.attribute("Type").unwrap_or_default().to_string();
                let raw_target = rel.attribute("Target")?;
                let external = rel.attribute("TargetMode") == Some("External");
                let target = if external {
                    raw_target.to_string()
                } else {
                    resolve_target(source_part, raw_target)
                };
                Some(Relationship {
                    id,
                    rel_type,
                    target,
                    external,
                })
            })
            .collect())
    }

    /// Name of the main document part (`xl/workbook.xml`, `ppt/presentation.xml`)
    pub fn main_part(&self) -> Result<String, CodecError> {
        self.relationships("")?
            .into_iter()
            .find(|r| r.rel_type.ends_with(OFFICE_DOCUMENT_REL))
            .map(|r| r.target)
            .ok_or_else(|| CodecError::MissingPart("officeDocument relationship".to_string()))
    }

    /// Write the package, substituting the given parts' contents
    pub fn save(&self, path: &Path, replacements: &HashMap<String, Vec<u8>>) -> Result<(), CodecError> {
        persist_with(path, |file| {
            let mut writer = ZipWriter::new(file);
            let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

            for part in &self.parts {
                let data = replacements
                    .get(&part.name)
                    .map(Vec::as_slice)
                    .unwrap_or(&part.data);
                writer.start_file(part.name.as_str(), options)?;
                writer.write_all(data)?;
            }
            writer.finish()?;
            Ok(())
        })?;

        debug!("Wrote package with {} parts to {:?}", self.parts.len(), path);
        Ok(())
    }
}

/// Fill a temporary file next to `path` and rename it into place
fn persist_with<F>(path: &Path, fill: F) -> Result<(), CodecError>
where
    F: FnOnce(&mut File) -> Result<(), CodecError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    fill(temp.as_file_mut())?;

    let file = temp.persist(path).map_err(|e| CodecError::Io(e.error))?;
    // temp files are created owner-only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    #[cfg(not(unix))]
    drop(file);
    Ok(())
}

/// Replace the file at `path` with `data` without exposing a partial file
pub fn write_atomically(path: &Path, data: &[u8]) -> Result<(), CodecError> {
    persist_with(path, |file| {
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    })?;
    debug!("Wrote {} bytes to {:?}", data.len(), path);
    Ok(())
}
