//! Argument hygiene for external tool invocations.

use std::path::Path;

const DANGEROUS_CHARS: [char; 11] = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];

/// Validate that a path doesn't contain shell metacharacters or dangerous sequences
pub(crate) fn validate_path(path: &str) -> Result<(), String> {
    if path.chars().any(|c| DANGEROUS_CHARS.contains(&c)) {
        return Err(format!("Path contains dangerous characters: {}", path));
    }

    if path.contains("..") {
        return Err(format!("Path contains directory traversal: {}", path));
    }

    Ok(())
}

/// Tool paths are restricted further: a bare binary name or a plain filesystem path.
pub(crate) fn validate_tool_path(tool_path: &str) -> Result<(), String> {
    if tool_path.is_empty() {
        return Err("Tool path cannot be empty".to_string());
    }

    validate_path(tool_path)?;

    if !tool_path
        .chars()
        .all(|c| c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\')
    {
        return Err(format!("Tool path contains unsafe characters: {}", tool_path));
    }

    Ok(())
}

/// Media inputs must be existing regular files with clean paths.
pub(crate) fn validate_media_file(path: &Path) -> Result<(), String> {
    validate_path(&path.to_string_lossy())?;

    if !path.is_file() {
        return Err(format!("Not a file: {}", path.display()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tool_path() {
        assert!(validate_tool_path("ffprobe").is_ok());
        assert!(validate_tool_path("/usr/local/bin/ffmpeg").is_ok());
        assert!(validate_tool_path("").is_err());
        assert!(validate_tool_path("ffmpeg; rm -rf /").is_err());
        assert!(validate_tool_path("$(whoami)").is_err());
        assert!(validate_tool_path("../bin/ffmpeg").is_err());
        assert!(validate_tool_path("ff mpeg").is_err());
    }

    #[test]
    fn test_validate_media_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(validate_media_file(file.path()).is_ok());

        let dir = tempfile::tempdir().unwrap();
        assert!(validate_media_file(dir.path()).is_err());
        assert!(validate_media_file(&dir.path().join("missing.mp4")).is_err());
        assert!(validate_media_file(Path::new("/tmp/a|b.mp4")).is_err());
    }
}
