use std::{collections::HashMap, io, path::Path};

use autosim::core::{CodeDescriber, CodeInfo, DiagnosticCode};

/// Reference page for a code.
pub fn info_url(code: &DiagnosticCode) -> String {
    format!(
        "{}/{}",
        crate::INFO_BASE_URL,
        code.as_str().to_ascii_lowercase()
    )
}

fn untitled(code: &DiagnosticCode) -> CodeInfo {
    CodeInfo {
        code: *code,
        title: None,
        url: info_url(code),
    }
}

/// Describer backed by a description file.
///
/// Each record holds a code followed by its description. Fields are separated
/// by a comma, semicolon or tab, detected from the first record.
#[derive(Debug, Default)]
pub struct CsvDescriber {
    descriptions: HashMap<DiagnosticCode, String>,
}

impl CsvDescriber {
    /// Load descriptions from file.
    ///
    /// A missing file yields a describer without descriptions.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();

        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let describer = Self::parse(&contents)?;
                log::debug!(
                    "Loaded {} code descriptions from {}",
                    describer.len(),
                    path.display()
                );
                Ok(describer)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("Description file {} not found", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Parse descriptions from text.
    pub fn parse(contents: &str) -> io::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .delimiter(Self::sniff_delimiter(contents))
            .from_reader(contents.as_bytes());

        let mut descriptions = HashMap::new();

        for record in reader.records() {
            let record = record.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

            let code = match record.get(0).and_then(|field| field.parse().ok()) {
                Some(code) => code,
                None => continue,
            };

            // Unquoted descriptions may contain the delimiter.
            let description = record
                .iter()
                .skip(1)
                .collect::<Vec<_>>()
                .join(", ")
                .trim()
                .to_string();

            if !description.is_empty() {
                descriptions.insert(code, description);
            }
        }

        Ok(Self { descriptions })
    }

    fn sniff_delimiter(contents: &str) -> u8 {
        let first = contents
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .unwrap_or_default();

        first
            .bytes()
            .find(|b| matches!(b, b',' | b';' | b'\t'))
            .unwrap_or(b',')
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

impl CodeDescriber for CsvDescriber {
    fn describe(&self, code: &DiagnosticCode) -> CodeInfo {
        CodeInfo {
            title: self.descriptions.get(code).cloned(),
            ..untitled(code)
        }
    }
}

/// Describer deriving a title from the structure of the code.
pub struct HeuristicDescriber;

impl HeuristicDescriber {
    fn genericity(code: &DiagnosticCode) -> &'static str {
        match code.digit(0) {
            0 => "SAE generic",
            1..=3 => "manufacturer-specific",
            _ => "unspecified",
        }
    }

    fn subsystem(code: &DiagnosticCode) -> &'static str {
        match code.digit(1) {
            0 | 1 => "Fuel and Air Metering",
            2 => "Fuel and Air Metering (Injector Circuit)",
            3 => "Ignition System or Misfire",
            4 => "Auxiliary Emission Controls",
            5 => "Vehicle Speed and Idle Control",
            6 => "Computer Output Circuit",
            7 | 8 => "Transmission",
            _ => "Subsystem",
        }
    }
}

impl CodeDescriber for HeuristicDescriber {
    fn describe(&self, code: &DiagnosticCode) -> CodeInfo {
        CodeInfo {
            title: Some(format!(
                "{} - {} ({})",
                code.system(),
                Self::subsystem(code),
                Self::genericity(code)
            )),
            ..untitled(code)
        }
    }
}

/// Describer asking each inner describer in turn.
///
/// The first describer returning a title wins. When none does, the info only
/// carries the reference page.
#[derive(Default)]
pub struct ChainDescriber {
    describers: Vec<Box<dyn CodeDescriber>>,
}

impl ChainDescriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a describer to the chain.
    pub fn with(mut self, describer: impl CodeDescriber + 'static) -> Self {
        self.describers.push(Box::new(describer));
        self
    }
}

impl CodeDescriber for ChainDescriber {
    fn describe(&self, code: &DiagnosticCode) -> CodeInfo {
        self.describers
            .iter()
            .map(|describer| describer.describe(code))
            .find(|info| info.title.is_some())
            .unwrap_or_else(|| untitled(code))
    }
}
