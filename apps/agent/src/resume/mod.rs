//! Resume loading: text extraction, skill detection and contact details.
//!
//! Deliberately simple. The result feeds relevance scoring and the contact fields of
//! application forms; it is not a general resume parser.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::automation::handlers::{ApplicationPacket, ContactDetails};
use crate::text::{collapse_whitespace, term_patterns};

/// Skills looked for when no vocabulary is configured.
pub const DEFAULT_SKILLS: &[&str] = &[
    "python", "java", "c++", "javascript", "typescript", "rust", "go", "react", "angular",
    "vue", "node.js", "next.js", "sql", "mysql", "postgresql", "mongodb", "nosql", "dynamodb",
    "docker", "kubernetes", "aws", "azure", "gcp", "terraform", "ansible", "selenium",
    "django", "flask", "fastapi", "git", "api", "rest", "graphql", "html", "css",
    "machine learning", "data science", "pandas", "numpy", "scikit-learn", "tensorflow",
    "pytorch", "deep learning", "nlp", "data analysis", "business intelligence", "tableau",
    "power bi", "big data", "spark", "hadoop",
];

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("resume file {0} does not exist")]
    NotFound(PathBuf),

    #[error("could not read resume {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not extract text from PDF {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    #[error("could not extract text from Word document {path}: {message}")]
    Docx { path: PathBuf, message: String },

    #[error("unsupported resume format '{0}' (use .pdf, .docx, .txt or .md)")]
    UnsupportedFormat(String),

    #[error("resume {0} contains no text")]
    Empty(PathBuf),
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeRecord {
    pub full_text: String,
    pub skills: BTreeSet<String>,
    pub candidate_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Absolute path, as handed to browser file inputs.
    pub file_path: PathBuf,
}

impl ResumeRecord {
    pub fn contact_details(&self) -> ContactDetails {
        ContactDetails {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone().unwrap_or_default(),
            phone: self.phone.clone().unwrap_or_default(),
        }
    }

    pub fn application_packet(&self, application_text: Option<String>) -> ApplicationPacket {
        ApplicationPacket {
            resume_path: self.file_path.clone(),
            applicant: self.contact_details(),
            application_text,
        }
    }
}

/// Reads `path` and builds the record. `vocabulary` lists the skills to look for.
pub fn load_resume(path: &Path, vocabulary: &[String]) -> Result<ResumeRecord, ResumeError> {
    if !path.is_file() {
        return Err(ResumeError::NotFound(path.to_path_buf()));
    }
    let file_path = std::fs::canonicalize(path).map_err(|source| ResumeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let full_text = extract_text(&file_path)?;
    if full_text.trim().is_empty() {
        return Err(ResumeError::Empty(file_path));
    }

    let skills = extract_skills(&full_text, vocabulary);
    let candidate_name = find_name(&full_text).unwrap_or_default();
    let (first_name, last_name) = split_name(&candidate_name);
    let record = ResumeRecord {
        email: find_email(&full_text),
        phone: find_phone(&full_text),
        skills,
        candidate_name,
        first_name,
        last_name,
        full_text,
        file_path,
    };
    info!(
        path = %record.file_path.display(),
        skills = record.skills.len(),
        has_email = record.email.is_some(),
        "Resume loaded"
    );
    Ok(record)
}

fn extract_text(path: &Path) -> Result<String, ResumeError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => {
            let bytes = std::fs::read(path).map_err(|source| ResumeError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ResumeError::Pdf {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
        "docx" => docx_text(path),
        "txt" | "md" => std::fs::read_to_string(path).map_err(|source| ResumeError::Io {
            path: path.to_path_buf(),
            source,
        }),
        other => Err(ResumeError::UnsupportedFormat(other.to_string())),
    }
}

/// Body text of a Word document: the `w:t` runs of `word/document.xml`, one line
/// per paragraph.
fn docx_text(path: &Path) -> Result<String, ResumeError> {
    let docx_error = |message: String| ResumeError::Docx {
        path: path.to_path_buf(),
        message,
    };
    let file = File::open(path).map_err(|source| ResumeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| docx_error(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| docx_error(format!("word/document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| docx_error(e.to_string()))?;
    document_text(&xml).map_err(|e| docx_error(e.to_string()))
}

fn document_text(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_run => text.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}

pub fn extract_skills(text: &str, vocabulary: &[String]) -> BTreeSet<String> {
    let patterns = term_patterns(vocabulary.iter().map(String::as_str));
    let found: BTreeSet<String> = patterns
        .iter()
        .filter(|p| p.is_match(text))
        .map(|p| p.term().to_string())
        .collect();
    debug!(found = found.len(), vocabulary = patterns.len(), "Skills extracted");
    found
}

pub fn default_vocabulary() -> Vec<String> {
    DEFAULT_SKILLS.iter().map(|s| s.to_string()).collect()
}

static EMAIL: OnceLock<Regex> = OnceLock::new();
static PHONE: OnceLock<Regex> = OnceLock::new();

pub fn find_email(text: &str) -> Option<String> {
    let re = EMAIL.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email regex")
    });
    re.find(text).map(|m| m.as_str().to_string())
}

pub fn find_phone(text: &str) -> Option<String> {
    let re = PHONE.get_or_init(|| {
        Regex::new(r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{2,4}\)|\d{2,4})[\s.-]?\d{3,4}[\s.-]?\d{3,4}")
            .expect("phone regex")
    });
    re.find(text).map(|m| m.as_str().trim().to_string())
}

/// First non-empty line that looks like a name: a few words, no digits, no '@'.
fn find_name(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(5)
        .find(|line| {
            let words = line.split_whitespace().count();
            (1..=4).contains(&words)
                && !line.contains('@')
                && !line.chars().any(|c| c.is_ascii_digit())
        })
        .map(collapse_whitespace)
}

fn split_name(name: &str) -> (String, String) {
    let mut words = name.split_whitespace();
    let first = words.next().unwrap_or_default().to_string();
    let last = words.last().unwrap_or_default().to_string();
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RESUME: &str = "Ada Lovelace\n\
        London | ada@example.com | +44 (20) 7946 0000\n\
        \n\
        Experience\n\
        Built data pipelines in Python and SQL, deployed with Docker on AWS.\n\
        Some C++ and a little JavaScript.\n";

    fn resume_file(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_text_resume() {
        let file = resume_file(RESUME, ".txt");
        let record = load_resume(file.path(), &default_vocabulary()).unwrap();

        assert_eq!(record.candidate_name, "Ada Lovelace");
        assert_eq!(record.first_name, "Ada");
        assert_eq!(record.last_name, "Lovelace");
        assert_eq!(record.email.as_deref(), Some("ada@example.com"));
        assert_eq!(record.phone.as_deref(), Some("+44 (20) 7946 0000"));
        assert!(record.file_path.is_absolute());
        let skills: Vec<&str> = record.skills.iter().map(String::as_str).collect();
        assert_eq!(skills, vec!["aws", "c++", "docker", "javascript", "python", "sql"]);
    }

    #[test]
    fn test_contact_details_feed_application_packet() {
        let file = resume_file(RESUME, ".md");
        let record = load_resume(file.path(), &default_vocabulary()).unwrap();
        let packet = record.application_packet(Some("Dear team".to_string()));
        assert_eq!(packet.resume_path, record.file_path);
        assert_eq!(packet.applicant.email, "ada@example.com");
        assert_eq!(packet.application_text.as_deref(), Some("Dear team"));
    }

    #[test]
    fn test_custom_vocabulary() {
        let skills = extract_skills(RESUME, &["Data Pipelines".to_string(), "go".to_string()]);
        assert_eq!(skills.into_iter().collect::<Vec<_>>(), vec!["data pipelines"]);
    }

    #[test]
    fn test_missing_and_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_resume(&dir.path().join("cv.pdf"), &default_vocabulary()).unwrap_err();
        assert!(matches!(err, ResumeError::NotFound(_)));

        let rtf = resume_file(RESUME, ".rtf");
        let err = load_resume(rtf.path(), &default_vocabulary()).unwrap_err();
        assert!(matches!(err, ResumeError::UnsupportedFormat(ext) if ext == "rtf"));
    }

    fn write_docx(path: &Path, paragraphs: &[&str]) {
        let body: String = paragraphs
            .iter()
            .map(|p| format!(r#"<w:p><w:r><w:t xml:space="preserve">{p}</w:t></w:r></w:p>"#))
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        zip.start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_load_word_resume() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.docx");
        write_docx(
            &path,
            &[
                "Ada Lovelace",
                "ada@example.com | +44 (20) 7946 0000",
                "Rust &amp; SQL services, shipped with Docker.",
            ],
        );

        let record = load_resume(&path, &default_vocabulary()).unwrap();

        assert_eq!(record.candidate_name, "Ada Lovelace");
        assert_eq!(record.email.as_deref(), Some("ada@example.com"));
        assert!(record.full_text.contains("Rust & SQL services"));
        let skills: Vec<&str> = record.skills.iter().map(String::as_str).collect();
        assert_eq!(skills, vec!["docker", "rust", "sql"]);
    }

    #[test]
    fn test_word_resume_that_is_not_a_zip_is_reported() {
        let file = resume_file(RESUME, ".docx");
        let err = load_resume(file.path(), &default_vocabulary()).unwrap_err();
        assert!(matches!(err, ResumeError::Docx { .. }));
    }

    #[test]
    fn test_document_text_keeps_paragraphs_and_tabs() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>Skills</w:t><w:tab/><w:t>Rust</w:t></w:r></w:p><w:p><w:r><w:t>Go</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(document_text(xml).unwrap(), "Skills\tRust\nGo\n");
    }

    #[test]
    fn test_empty_resume_is_rejected() {
        let file = resume_file("   \n", ".txt");
        assert!(matches!(
            load_resume(file.path(), &default_vocabulary()),
            Err(ResumeError::Empty(_))
        ));
    }

    #[test]
    fn test_phone_formats() {
        assert_eq!(find_phone("call 555-123-4567 now").as_deref(), Some("555-123-4567"));
        assert_eq!(find_phone("no digits here"), None);
    }
}
