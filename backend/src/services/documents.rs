use std::path::Path;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Short upper-case type label for a document, e.g. `PDF` or `JPEG`.
///
/// Uses the subtype of the declared content type, then the type guessed from
/// the file extension, and falls back to `FILE`.
#[must_use]
pub fn display_type(file_name: &str, content_type: Option<&str>) -> String {
    let declared = content_type
        .map(str::trim)
        .filter(|ct| !ct.is_empty() && *ct != mime_guess::mime::APPLICATION_OCTET_STREAM.essence_str())
        .and_then(subtype_of);
    if let Some(subtype) = declared {
        return subtype;
    }

    let has_extension = Path::new(file_name).extension().is_some();
    has_extension
        .then(|| mime_guess::from_path(file_name).first())
        .flatten()
        .map(|mime| mime.subtype().as_str().to_ascii_uppercase())
        .unwrap_or_else(|| "FILE".to_string())
}

fn subtype_of(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim();
    let (_, subtype) = essence.split_once('/')?;
    let subtype = subtype.trim();
    (!subtype.is_empty()).then(|| subtype.to_ascii_uppercase())
}

/// Human-readable size with one decimal for KB and MB.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: u64) -> String {
    let size = bytes as f64;
    if size < KIB {
        format!("{bytes} B")
    } else if size < MIB {
        format!("{:.1} KB", size / KIB)
    } else {
        format!("{:.1} MB", size / MIB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_content_type_wins() {
        assert_eq!(display_type("lease.bin", Some("application/pdf")), "PDF");
        assert_eq!(display_type("scan", Some("image/jpeg; charset=binary")), "JPEG");
    }

    #[test]
    fn extension_is_used_when_type_is_missing_or_generic() {
        assert_eq!(display_type("lease.pdf", None), "PDF");
        assert_eq!(display_type("photo.png", Some("application/octet-stream")), "PNG");
    }

    #[test]
    fn unknown_files_are_labelled_file() {
        assert_eq!(display_type("README", None), "FILE");
        assert_eq!(display_type("data.zzunknown", None), "FILE");
    }

    #[test]
    fn sizes_use_binary_units_with_one_decimal() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }
}
