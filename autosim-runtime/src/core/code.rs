/// Vehicle system a diagnostic trouble code belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum System {
    /// Engine and transmission.
    Powertrain,
    /// Cabin and body electronics.
    Body,
    /// Brakes, steering and suspension.
    Chassis,
    /// Vehicle network and communication.
    Network,
}

impl System {
    fn from_letter(letter: u8) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            b'P' => Some(Self::Powertrain),
            b'B' => Some(Self::Body),
            b'C' => Some(Self::Chassis),
            b'U' => Some(Self::Network),
            _ => None,
        }
    }
}

impl std::fmt::Display for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Powertrain => write!(f, "Powertrain"),
            Self::Body => write!(f, "Body"),
            Self::Chassis => write!(f, "Chassis"),
            Self::Network => write!(f, "Network"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidCode(String);

impl std::error::Error for InvalidCode {}

impl std::fmt::Display for InvalidCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid diagnostic trouble code: {:?}", self.0)
    }
}

/// Diagnostic trouble code.
///
/// A code is one system letter followed by four digits, for example `P0300`.
/// The letter is always stored in upper case.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode([u8; 5]);

/// Codes used when no primary code source is available.
pub const FALLBACK_CODES: [DiagnosticCode; 5] = [
    DiagnosticCode(*b"P0300"),
    DiagnosticCode(*b"P0420"),
    DiagnosticCode(*b"P0171"),
    DiagnosticCode(*b"P0455"),
    DiagnosticCode(*b"P0133"),
];

impl DiagnosticCode {
    /// Encoded size of a code in bytes.
    pub const SIZE: usize = 5;

    /// Retrieve the code as string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        // The bytes are ASCII by construction.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Retrieve the raw code bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 5] {
        &self.0
    }

    /// Retrieve the vehicle system of the code.
    pub fn system(&self) -> System {
        System::from_letter(self.0[0]).unwrap_or(System::Powertrain)
    }

    /// Retrieve the digit at the given position, counting from the first digit.
    #[inline]
    pub fn digit(&self, index: usize) -> u8 {
        self.0[1 + index] - b'0'
    }

    /// Whether the code is defined by SAE rather than by the manufacturer.
    #[inline]
    pub fn is_generic(&self) -> bool {
        self.digit(0) == 0
    }
}

impl TryFrom<&[u8]> for DiagnosticCode {
    type Error = InvalidCode;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let invalid = || InvalidCode(String::from_utf8_lossy(value).into_owned());

        if value.len() != Self::SIZE {
            return Err(invalid());
        }
        if System::from_letter(value[0]).is_none() {
            return Err(invalid());
        }
        if !value[1..].iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }

        let mut bytes = [0u8; 5];
        bytes.copy_from_slice(value);
        bytes[0] = bytes[0].to_ascii_uppercase();

        Ok(Self(bytes))
    }
}

impl std::str::FromStr for DiagnosticCode {
    type Err = InvalidCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.trim().as_bytes())
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Debug for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DiagnosticCode({})", self.as_str())
    }
}

/// Human readable information about a diagnostic trouble code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeInfo {
    /// The code described.
    pub code: DiagnosticCode,
    /// Short title, if any source knows the code.
    pub title: Option<String>,
    /// Reference page for the code.
    pub url: String,
}

impl std::fmt::Display for CodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{}: {} ({})", self.code, title, self.url),
            None => write!(f, "{} ({})", self.code, self.url),
        }
    }
}

/// Resolve diagnostic trouble codes into human readable information.
///
/// Describers only enrich log output. The simulation never depends on the
/// outcome of a lookup.
pub trait CodeDescriber: Send + Sync {
    /// Describe the code. A missing title is not an error.
    fn describe(&self, code: &DiagnosticCode) -> CodeInfo;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code() {
        let code: DiagnosticCode = "P0300".parse().unwrap();

        assert_eq!(code.as_str(), "P0300");
        assert_eq!(code.system(), System::Powertrain);
        assert!(code.is_generic());
        assert_eq!(code.digit(1), 3);
    }

    #[test]
    fn test_parse_lowercase() {
        let code: DiagnosticCode = " u1234 ".parse().unwrap();

        assert_eq!(code.to_string(), "U1234");
        assert_eq!(code.system(), System::Network);
        assert!(!code.is_generic());
    }

    #[test]
    fn test_parse_invalid() {
        assert!("X0300".parse::<DiagnosticCode>().is_err());
        assert!("P030".parse::<DiagnosticCode>().is_err());
        assert!("P03000".parse::<DiagnosticCode>().is_err());
        assert!("P03a0".parse::<DiagnosticCode>().is_err());
        assert!("".parse::<DiagnosticCode>().is_err());
    }

    #[test]
    fn test_fallback_codes() {
        for code in FALLBACK_CODES {
            assert_eq!(code, code.as_str().parse().unwrap());
        }
    }
}
