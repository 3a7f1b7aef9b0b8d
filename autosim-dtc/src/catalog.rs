use std::{io, path::Path};

use autosim::core::DiagnosticCode;

/// Ordered set of known diagnostic trouble codes.
///
/// The catalog is read from a text or CSV file. Each line contributes its
/// first token that is a valid code. Blank lines and lines starting with `#`
/// are skipped. Duplicates are removed, keeping the first occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeCatalog {
    codes: Vec<DiagnosticCode>,
}

impl CodeCatalog {
    /// Load the catalog from file.
    ///
    /// A missing file yields an empty catalog.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();

        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let catalog = Self::parse(&contents);
                log::debug!("Loaded {} codes from {}", catalog.len(), path.display());
                Ok(catalog)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("Code file {} not found, using fallback codes", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Parse the catalog from text.
    pub fn parse(contents: &str) -> Self {
        let mut codes = Vec::new();

        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let code = line
                .split(|c: char| !c.is_ascii_alphanumeric())
                .find_map(|token| token.parse::<DiagnosticCode>().ok());

            if let Some(code) = code {
                if !codes.contains(&code) {
                    codes.push(code);
                }
            }
        }

        Self { codes }
    }

    #[inline]
    pub fn codes(&self) -> &[DiagnosticCode] {
        &self.codes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl From<CodeCatalog> for Vec<DiagnosticCode> {
    fn from(catalog: CodeCatalog) -> Self {
        catalog.codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let catalog = CodeCatalog::parse(
            "# known codes\n\
             P0300,Random misfire\n\
             \n\
             p0420;Catalyst efficiency\n\
             code: B1000 body\n\
             P0300 again\n\
             P03000 too long\n\
             X1234\n\
             \tU0100\n",
        );

        let codes: Vec<String> = catalog.codes().iter().map(|c| c.to_string()).collect();
        assert_eq!(codes, vec!["P0300", "P0420", "B1000", "U0100"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(CodeCatalog::parse("").is_empty());
        assert!(CodeCatalog::parse("# nothing\n\n").is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("autosim-dtc-missing-codes.csv");

        let catalog = CodeCatalog::load(path).unwrap();

        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("autosim-dtc-codes-{}.csv", std::process::id()));
        std::fs::write(&path, "C0035\nP0171\n").unwrap();

        let catalog = CodeCatalog::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(catalog.len(), 2);
        assert_eq!(Vec::from(catalog)[1].as_str(), "P0171");
    }
}
