// diag.rs — Unified diagnostics model
//
// Provides the diagnostic types reported by every emitter component. An
// emission pass never aborts on a diagnosable problem; it appends a
// `Diagnostic` and keeps rendering.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0200`, `W0500`).
///
/// Codes are `&'static str` constants defined in the `codes` module.
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl DiagCode {
    /// Error class implied by the code's hundreds digit.
    pub fn class(self) -> Option<ErrorClass> {
        match self.0.get(0..3) {
            Some("E01") => Some(ErrorClass::Structural),
            Some("E02") => Some(ErrorClass::Shape),
            Some("E03") => Some(ErrorClass::Type),
            Some("E04") => Some(ErrorClass::Unsupported),
            _ => None,
        }
    }
}

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    // Structural
    pub const E0100: DiagCode = DiagCode("E0100");
    pub const E0101: DiagCode = DiagCode("E0101");
    pub const E0102: DiagCode = DiagCode("E0102");
    pub const E0103: DiagCode = DiagCode("E0103");
    pub const E0104: DiagCode = DiagCode("E0104");
    pub const E0105: DiagCode = DiagCode("E0105");
    pub const E0106: DiagCode = DiagCode("E0106");
    // Shape
    pub const E0200: DiagCode = DiagCode("E0200");
    pub const E0201: DiagCode = DiagCode("E0201");
    pub const E0202: DiagCode = DiagCode("E0202");
    pub const E0203: DiagCode = DiagCode("E0203");
    // Type
    pub const E0300: DiagCode = DiagCode("E0300");
    pub const E0301: DiagCode = DiagCode("E0301");
    pub const E0302: DiagCode = DiagCode("E0302");
    pub const E0303: DiagCode = DiagCode("E0303");
    pub const E0304: DiagCode = DiagCode("E0304");
    // Unsupported operation
    pub const E0400: DiagCode = DiagCode("E0400");
    pub const E0401: DiagCode = DiagCode("E0401");
    // Warnings
    pub const W0500: DiagCode = DiagCode("W0500");
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Structural,
    Shape,
    Type,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::Structural => "StructuralError",
            ErrorClass::Shape => "ShapeError",
            ErrorClass::Type => "TypeError",
            ErrorClass::Unsupported => "UnsupportedOperationError",
        };
        f.write_str(name)
    }
}

// ── Origin ───────────────────────────────────────────────────────────────

/// Where in the program model a diagnostic was raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin {
    pub function: Option<String>,
    pub op: Option<String>,
    pub line: Option<u32>,
}

impl Origin {
    pub fn is_empty(&self) -> bool {
        self.function.is_none() && self.op.is_none() && self.line.is_none()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(func) = &self.function {
            parts.push(format!("@{}", func));
        }
        if let Some(op) = &self.op {
            parts.push(op.clone());
        }
        if let Some(line) = self.line {
            parts.push(format!("L{}", line));
        }
        f.write_str(&parts.join(" "))
    }
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic raised during emission.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub origin: Origin,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code or hint.
    pub fn new(level: DiagLevel, origin: Origin, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            origin,
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagLevel::Error
    }

    pub fn class(&self) -> Option<ErrorClass> {
        self.code.and_then(DiagCode::class)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        if let Some(code) = &self.code {
            write!(f, "{}[{}]: ", level, code)?;
        } else {
            write!(f, "{}: ", level)?;
        }
        if !self.origin.is_empty() {
            write!(f, "{}: ", self.origin)?;
        }
        f.write_str(&self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}
