//! File utilities for content extraction.

use std::fs;
use std::io;
use std::path::Path;

/// Decode bytes as UTF-8, falling back to Latin-1.
///
/// Latin-1 maps every byte to the code point of the same value, so the
/// fallback never fails.
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().iter().map(|&b| char::from(b)).collect(),
    }
}

/// Read a file as text, UTF-8 first, then Latin-1.
pub fn read_text_lossless(path: &Path) -> io::Result<String> {
    fs::read(path).map(decode_text)
}

/// Lower-cased extension of `path`, without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// True if the file name ends with any of the given suffixes (e.g. `.md`).
///
/// Comparison is case-insensitive; an empty suffix list matches nothing.
pub fn has_suffix(path: &Path, suffixes: &[String]) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy().to_lowercase();
    suffixes
        .iter()
        .any(|suffix| !suffix.is_empty() && name.ends_with(&suffix.to_lowercase()))
}

/// Normalize user-supplied extensions so that `md` and `.md` mean the same.
pub fn normalize_extensions<S: AsRef<str>>(extensions: &[S]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| ext.as_ref().trim())
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            if ext.starts_with('.') {
                ext.to_lowercase()
            } else {
                format!(".{}", ext.to_lowercase())
            }
        })
        .collect()
}

/// Check if extension indicates a binary format that cannot be read as text.
pub fn is_binary_extension(ext: &str) -> bool {
    matches!(
        ext,
        "exe"
            | "dll"
            | "so"
            | "dylib"
            | "a"
            | "o"
            | "obj"
            | "png"
            | "jpg"
            | "jpeg"
            | "gif"
            | "bmp"
            | "ico"
            | "webp"
            | "mp3"
            | "mp4"
            | "avi"
            | "mkv"
            | "mov"
            | "wav"
            | "flac"
            | "zip"
            | "tar"
            | "gz"
            | "bz2"
            | "xz"
            | "7z"
            | "rar"
            | "doc"
            | "docx"
            | "xls"
            | "xlsx"
            | "ppt"
            | "pptx"
            | "woff"
            | "woff2"
            | "ttf"
            | "otf"
            | "class"
            | "jar"
            | "pyc"
            | "db"
            | "sqlite"
            | "sqlite3"
            | "bin"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("héllo".as_bytes().to_vec()), "héllo");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        // "café" in Latin-1; 0xE9 alone is invalid UTF-8
        let bytes = vec![b'c', b'a', b'f', 0xE9];
        assert_eq!(decode_text(bytes), "café");
    }

    #[test]
    fn test_has_suffix() {
        let exts = normalize_extensions(&["txt", ".MD"]);
        assert!(has_suffix(&PathBuf::from("/a/notes.txt"), &exts));
        assert!(has_suffix(&PathBuf::from("/a/README.md"), &exts));
        assert!(!has_suffix(&PathBuf::from("/a/report.pdf"), &exts));
        assert!(!has_suffix(&PathBuf::from("/a/notes.txt"), &[]));
    }

    #[test]
    fn test_normalize_extensions() {
        assert_eq!(
            normalize_extensions(&["TXT", " .md ", ""]),
            vec![".txt".to_string(), ".md".to_string()]
        );
    }

    #[test]
    fn test_is_binary_extension() {
        assert!(is_binary_extension("exe"));
        assert!(is_binary_extension("png"));
        assert!(!is_binary_extension("pdf"));
        assert!(!is_binary_extension("md"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("x/Report.PDF")).as_deref(), Some("pdf"));
        assert_eq!(extension_of(Path::new("Makefile")), None);
    }
}
