//! Template loading. The template is a deployment artifact; its absence is a
//! configuration fault surfaced as `MissingTemplate`, never retried.

use std::path::Path;

use crate::errors::AppError;

pub fn load_template(path: &str) -> Result<String, AppError> {
    if !Path::new(path).is_file() {
        return Err(AppError::MissingTemplate(path.to_string()));
    }
    std::fs::read_to_string(path).map_err(|e| AppError::MissingTemplate(format!("{path}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_template_missing_file() {
        let err = load_template("/nonexistent/resume.tex").unwrap_err();
        assert!(matches!(err, AppError::MissingTemplate(_)));
    }

    #[test]
    fn test_load_template_reads_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "\\documentclass{{article}}").unwrap();
        let contents = load_template(file.path().to_str().unwrap()).unwrap();
        assert!(contents.contains("documentclass"));
    }
}
