//! Bugreport zip inspection
//!
//! Pulls the interesting entries out of a bugreport zip, sorts them into
//! images, audio recordings and dumpstate output, and checks each one
//! against simple size and content heuristics.

use colored::Colorize;
use regex::Regex;
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::{Component, Path};
use std::sync::LazyLock;

use crate::common::Result;

/// Text present in every dumpstate output
pub const DUMPSTATE_MARKER: &str = "== dumpstate:";

/// Dumpstate zip entries smaller than this are suspicious
pub const MIN_DUMPSTATE_COMPRESSED_SIZE: u64 = 100 * 1024;

pub const FINGERPRINT_PROPERTY: &str = "ro.build.fingerprint";

/// Upper bound on the buffer preallocated for one zip entry
const MAX_SIZE_HINT: u64 = 64 << 20;

/// Zip entry extensions worth extracting
const EXTRACTED_EXTENSIONS: [&str; 4] = ["txt", "jpg", "png", "3gp"];

/// Android build property line, e.g. `[ro.build.type]: [userdebug]`
static PROP_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.+)\]: \[(.+)\]$").expect("valid property regex"));

/// A file read out of a bugreport zip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub name: String,
    pub content: Vec<u8>,
    /// Uncompressed size
    pub size: u64,
    pub compressed_size: u64,
}

impl ExtractedFile {
    /// Text after the last `.`; empty if there is none
    pub fn extension(&self) -> &str {
        extension_of(&self.name)
    }

    /// Content with every non-ASCII byte dropped
    pub fn ascii_content(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.is_ascii())
            .map(|&b| b as char)
            .collect()
    }
}

fn extension_of(name: &str) -> &str {
    name.rsplit_once('.').map_or("", |(_, ext)| ext)
}

/// What a bugreport file is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Image,
    Audio,
    DiagnosticDump,
    Ignored,
}

/// Classify a file by extension and, for text files, by content
pub fn classify(file: &ExtractedFile) -> Category {
    match file.extension() {
        "png" | "jpg" => Category::Image,
        "3gp" => Category::Audio,
        "txt" if file.ascii_content().contains(DUMPSTATE_MARKER) => Category::DiagnosticDump,
        _ => Category::Ignored,
    }
}

/// Build properties printed by dumpstate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildProperties {
    properties: HashMap<String, String>,
}

impl BuildProperties {
    /// Collect every `[key]: [value]` line; later duplicates win
    pub fn parse(text: &str) -> Self {
        let properties = text
            .split('\n')
            .filter_map(|line| PROP_LINE_RE.captures(line.trim()))
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .collect();
        Self { properties }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// `ro.build.fingerprint`, empty when dumpstate did not print it
    pub fn fingerprint(&self) -> &str {
        self.get(FINGERPRINT_PROPERTY).unwrap_or_default()
    }

}

/// Outcome of checking one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileValidation {
    pub valid: bool,
    pub message: String,
}

impl FileValidation {
    fn valid(message: String) -> Self {
        Self {
            valid: true,
            message,
        }
    }

    fn invalid(message: String) -> Self {
        Self {
            valid: false,
            message,
        }
    }

    /// Message as shown on the terminal; invalid entries are red
    pub fn render(&self) -> String {
        if self.valid {
            self.message.clone()
        } else {
            self.message.red().to_string()
        }
    }
}

fn kilobytes(bytes: u64) -> u64 {
    bytes / 1024
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

pub fn validate_image(file: &ExtractedFile) -> FileValidation {
    if file.compressed_size == 0 {
        return FileValidation::invalid(format!("[Invalid] Image {} is empty.", file.name));
    }
    FileValidation::valid(format!("{} ({} kb)", file.name, kilobytes(file.compressed_size)))
}

pub fn validate_audio(file: &ExtractedFile) -> FileValidation {
    if file.compressed_size == 0 {
        return FileValidation::invalid(format!("[Invalid] Audio {} is empty", file.name));
    }
    FileValidation::valid(format!("{} ({} kb)", file.name, kilobytes(file.compressed_size)))
}

pub fn validate_dumpstate(file: &ExtractedFile, properties: &BuildProperties) -> FileValidation {
    if file.compressed_size < MIN_DUMPSTATE_COMPRESSED_SIZE {
        return FileValidation::invalid(format!(
            "[Invalid] Suspicious dumpstate: {}, size: {} bytes",
            file.name, file.compressed_size
        ));
    }
    if properties.fingerprint().is_empty() {
        return FileValidation::invalid(format!(
            "[Invalid] Strange dumpstate without fingerprint: {}",
            file.name
        ));
    }
    FileValidation::valid(format!(
        "{} ({:.2} mb)",
        file.name,
        megabytes(file.compressed_size)
    ))
}

/// Read every txt, jpg, png and 3gp entry of a zip archive
pub fn extract_important_files<R: Read + Seek>(reader: R) -> Result<Vec<ExtractedFile>> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut files = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if !EXTRACTED_EXTENSIONS.contains(&extension_of(&name)) {
            continue;
        }

        // the declared size comes from the archive and may be bogus
        let mut content = Vec::with_capacity(entry.size().min(MAX_SIZE_HINT) as usize);
        entry.read_to_end(&mut content)?;
        files.push(ExtractedFile {
            name,
            content,
            size: entry.size(),
            compressed_size: entry.compressed_size(),
        });
    }

    tracing::debug!(count = files.len(), "extracted bugreport files");
    Ok(files)
}

/// Counts and per-file checks for one bugreport zip
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub zip_name: String,
    pub zip_size: u64,
    /// Fingerprint of the last dumpstate seen, empty if none
    pub fingerprint: String,
    pub images: Vec<FileValidation>,
    pub audios: Vec<FileValidation>,
    pub dumpstates: Vec<FileValidation>,
}

impl ValidationReport {
    pub fn inspect(files: &[ExtractedFile], zip_name: &str, zip_size: u64) -> Self {
        let mut report = Self {
            zip_name: zip_name.to_string(),
            zip_size,
            fingerprint: String::new(),
            images: Vec::new(),
            audios: Vec::new(),
            dumpstates: Vec::new(),
        };

        for file in files {
            match classify(file) {
                Category::Image => report.images.push(validate_image(file)),
                Category::Audio => report.audios.push(validate_audio(file)),
                Category::DiagnosticDump => {
                    let properties = BuildProperties::parse(&file.ascii_content());
                    report.fingerprint = properties.fingerprint().to_string();
                    report.dumpstates.push(validate_dumpstate(file, &properties));
                }
                Category::Ignored => {}
            }
        }
        report
    }

    /// Whether any file failed its check
    pub fn has_invalid(&self) -> bool {
        self.images
            .iter()
            .chain(&self.audios)
            .chain(&self.dumpstates)
            .any(|v| !v.valid)
    }

    /// Printable report lines
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "Zip file: {} ({:.2} mb)",
                self.zip_name,
                megabytes(self.zip_size)
            ),
            format!("Fingerprint: {}", self.fingerprint),
            String::new(),
        ];
        let sections = [
            ("Images count", &self.images),
            ("Audio count", &self.audios),
            ("Dumpstate (bugreport) count", &self.dumpstates),
        ];
        for (i, (title, entries)) in sections.into_iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            lines.push(format!("{title}: {}", entries.len()));
            lines.extend(entries.iter().map(|v| format!("   - {}", v.render())));
        }
        lines
    }
}

/// Write every image, audio and dumpstate file into `dir`
///
/// Entries whose names would escape `dir` are skipped.
pub fn write_files(files: &[ExtractedFile], dir: &Path) -> Result<usize> {
    let mut written = 0;
    for file in files {
        if classify(file) == Category::Ignored {
            continue;
        }
        let relative = Path::new(&file.name);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            tracing::warn!(name = %file.name, "skipping zip entry with unsafe path");
            continue;
        }
        let target = dir.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, &file.content)?;
        written += 1;
    }
    Ok(written)
}
