//! Plain hash listings in `sha512sum` format
//!
//! Reads listings produced by `sha512sum` (optionally wrapped in an OpenPGP
//! clear signature) and renders an [`EntryStore`] back into that format.

use crate::error::ApiError;
use crate::store::EntryStore;
use crate::types::{ContentHash, RelPath};

/// File names recognized as listings when importing without explicit paths.
pub const LISTING_FILE_NAMES: &[&str] = &["SHA512SUM", "SHA512SUM.asc"];

/// Default file name written by export.
pub const DEFAULT_EXPORT_NAME: &str = "SHA512SUM";

const PGP_MESSAGE_BEGIN: &str = "-----BEGIN PGP SIGNED MESSAGE-----";
const PGP_SIGNATURE_BEGIN: &str = "-----BEGIN PGP SIGNATURE-----";
const PGP_SIGNATURE_END: &str = "-----END PGP SIGNATURE-----";

/// One `(hash, path)` line of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub path: RelPath,
    pub hash: ContentHash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Body,
    ArmorHeaders,
    SignedBody,
    Signature,
    Trailer,
}

/// Parse raw listing bytes. Input must be UTF-8.
pub fn parse_bytes(source_name: &str, bytes: &[u8]) -> Result<Vec<ListingEntry>, ApiError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ApiError::UnrecognizedFormat {
        source_name: source_name.to_string(),
        line: 0,
        reason: format!("not valid UTF-8: {}", e),
    })?;
    parse(source_name, text)
}

/// Parse listing text
///
/// Blank lines and `#` comments are skipped; an OpenPGP clear-signed wrapper is
/// stripped. Any other line that is not `<hash> <space|*><path>` fails the
/// whole listing.
pub fn parse(source_name: &str, text: &str) -> Result<Vec<ListingEntry>, ApiError> {
    let mut entries = Vec::new();
    let mut section = Section::Body;

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim_end_matches('\r');

        match section {
            Section::Body if line == PGP_MESSAGE_BEGIN && entries.is_empty() => {
                section = Section::ArmorHeaders;
                continue;
            }
            Section::ArmorHeaders => {
                if line.trim().is_empty() {
                    section = Section::SignedBody;
                }
                continue;
            }
            Section::SignedBody if line == PGP_SIGNATURE_BEGIN => {
                section = Section::Signature;
                continue;
            }
            Section::Signature => {
                if line == PGP_SIGNATURE_END {
                    section = Section::Trailer;
                }
                continue;
            }
            Section::Trailer => {
                if !line.trim().is_empty() {
                    return Err(unrecognized(source_name, line_no, "content after signature"));
                }
                continue;
            }
            _ => {}
        }

        let line = match section {
            Section::SignedBody => line.strip_prefix("- ").unwrap_or(line),
            _ => line,
        };
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        entries.push(parse_line(source_name, line_no, line)?);
    }

    match section {
        Section::ArmorHeaders | Section::Signature => Err(unrecognized(
            source_name,
            text.lines().count(),
            "truncated PGP signed message",
        )),
        _ => Ok(entries),
    }
}

fn parse_line(source_name: &str, line_no: usize, line: &str) -> Result<ListingEntry, ApiError> {
    // sha512sum prefixes the line with a backslash when the name was escaped
    let (escaped, line) = match line.strip_prefix('\\') {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    let (hash_text, rest) = line
        .split_once(' ')
        .ok_or_else(|| unrecognized(source_name, line_no, "expected '<hash>  <path>'"))?;
    let hash = ContentHash::from_hex(hash_text)
        .map_err(|reason| unrecognized(source_name, line_no, &reason))?;
    let name = rest
        .strip_prefix(' ')
        .or_else(|| rest.strip_prefix('*'))
        .ok_or_else(|| unrecognized(source_name, line_no, "expected two-space or ' *' separator"))?;

    let name = if escaped {
        unescape_name(name).ok_or_else(|| unrecognized(source_name, line_no, "bad escape"))?
    } else {
        name.to_string()
    };
    let path =
        RelPath::new(&name).map_err(|reason| unrecognized(source_name, line_no, &reason))?;

    Ok(ListingEntry { path, hash })
}

fn unrecognized(source_name: &str, line: usize, reason: &str) -> ApiError {
    ApiError::UnrecognizedFormat {
        source_name: source_name.to_string(),
        line,
        reason: reason.to_string(),
    }
}

fn unescape_name(name: &str) -> Option<String> {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            _ => return None,
        }
    }
    Some(out)
}

fn escape_name(name: &str) -> Option<String> {
    if !name.contains(['\\', '\n', '\r']) {
        return None;
    }
    Some(
        name.replace('\\', "\\\\")
            .replace('\n', "\\n")
            .replace('\r', "\\r"),
    )
}

/// Render a store as `sha512sum` output, sorted by path
pub fn render(store: &EntryStore) -> String {
    let mut out = String::new();
    for (path, entry) in store {
        match escape_name(path.as_str()) {
            Some(escaped) => {
                out.push('\\');
                out.push_str(&entry.hash.to_hex());
                out.push_str("  ");
                out.push_str(&escaped);
            }
            None => {
                out.push_str(&entry.hash.to_hex());
                out.push_str("  ");
                out.push_str(path.as_str());
            }
        }
        out.push('\n');
    }
    out
}
