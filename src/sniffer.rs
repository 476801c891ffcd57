/// Heuristic content sniffing for misnamed text files.
///
/// A sniffer holds an ordered table of script kinds, each with a list of regex
/// signatures. The first kind with any matching signature wins.
///
/// # Examples
///
/// ```
/// use topicsort::sniffer::{ContentSniffer, ScriptKind};
///
/// let sniffer = ContentSniffer::default();
/// assert_eq!(sniffer.sniff("def foo(): pass"), Some(ScriptKind::Python));
/// assert_eq!(sniffer.sniff("just some words"), None);
/// ```
use regex::{Regex, RegexBuilder};

/// The script or markup kinds a text blob can be sniffed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    /// Python source
    Python,
    /// POSIX shell script
    Shell,
    /// PowerShell script
    PowerShell,
    /// Windows batch file
    Batch,
    /// Windows command script
    Command,
    /// JavaScript source
    JavaScript,
    /// HTML markup
    Html,
}

impl ScriptKind {
    /// Returns the canonical extension for this kind, without the leading dot.
    ///
    /// ```
    /// use topicsort::sniffer::ScriptKind;
    ///
    /// assert_eq!(ScriptKind::Python.extension(), "py");
    /// assert_eq!(ScriptKind::PowerShell.extension(), "ps1");
    /// ```
    pub fn extension(&self) -> &'static str {
        match self {
            ScriptKind::Python => "py",
            ScriptKind::Shell => "sh",
            ScriptKind::PowerShell => "ps1",
            ScriptKind::Batch => "bat",
            ScriptKind::Command => "cmd",
            ScriptKind::JavaScript => "js",
            ScriptKind::Html => "html",
        }
    }
}

/// Built-in signature table, in evaluation order.
const DEFAULT_SIGNATURES: &[(ScriptKind, &[&str])] = &[
    (
        ScriptKind::Python,
        &[r"^import\s", r"^from\s", r"def\s", r"class\s"],
    ),
    (
        ScriptKind::Shell,
        &[r"^#!.*\bsh\b", r"\bfunction\b", r"\becho\b"],
    ),
    (
        ScriptKind::PowerShell,
        &[r"^#!.*powershell", r"Write-Host", r"Get-Process", r"\$[a-zA-Z_]"],
    ),
    (
        ScriptKind::Batch,
        &[r"@echo off", r"SET ", r"CALL ", r"EXIT /B"],
    ),
    (
        ScriptKind::Command,
        &[r"cmd\.exe", r"echo ", r"set ", r"exit "],
    ),
    (
        ScriptKind::JavaScript,
        &[r"function\s", r"var\s", r"const\s", r"let\s"],
    ),
    (ScriptKind::Html, &[r"<html>", r"<head>", r"<body>"]),
];

/// Classifies text into a [`ScriptKind`] by ordered, first-match-wins dispatch.
#[derive(Debug, Clone)]
pub struct ContentSniffer {
    table: Vec<(ScriptKind, Vec<Regex>)>,
}

impl ContentSniffer {
    /// Builds a sniffer from an ordered `(kind, signatures)` table.
    ///
    /// Signatures are compiled case-insensitive and multi-line.
    ///
    /// # Errors
    ///
    /// Returns the regex error of the first signature that fails to compile.
    pub fn with_signatures(table: &[(ScriptKind, &[&str])]) -> Result<Self, regex::Error> {
        let table = table
            .iter()
            .map(|(kind, signatures)| {
                let compiled = signatures
                    .iter()
                    .map(|signature| {
                        RegexBuilder::new(signature)
                            .case_insensitive(true)
                            .multi_line(true)
                            .build()
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((*kind, compiled))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { table })
    }

    /// Returns the first kind whose signatures match `content`, if any.
    pub fn sniff(&self, content: &str) -> Option<ScriptKind> {
        self.table
            .iter()
            .find(|(_, signatures)| signatures.iter().any(|re| re.is_match(content)))
            .map(|(kind, _)| *kind)
    }
}

impl Default for ContentSniffer {
    fn default() -> Self {
        Self::with_signatures(DEFAULT_SIGNATURES).expect("built-in signatures are valid regex")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_python() {
        let sniffer = ContentSniffer::default();
        assert_eq!(sniffer.sniff("def foo(): pass"), Some(ScriptKind::Python));
        assert_eq!(
            sniffer.sniff("# header\nimport os\nprint(os.getcwd())"),
            Some(ScriptKind::Python)
        );
    }

    #[test]
    fn test_sniff_shell() {
        let sniffer = ContentSniffer::default();
        assert_eq!(
            sniffer.sniff("#!/bin/bash\necho hello"),
            Some(ScriptKind::Shell)
        );
    }

    #[test]
    fn test_sniff_powershell() {
        let sniffer = ContentSniffer::default();
        assert_eq!(
            sniffer.sniff("Write-Host 'deploying'"),
            Some(ScriptKind::PowerShell)
        );
        assert_eq!(sniffer.sniff("$name = 'x'"), Some(ScriptKind::PowerShell));
    }

    #[test]
    fn test_sniff_batch() {
        let sniffer = ContentSniffer::default();
        assert_eq!(
            sniffer.sniff("SET PATH=C:\\tools\nCALL build.bat\nEXIT /B 0"),
            Some(ScriptKind::Batch)
        );
    }

    #[test]
    fn test_sniff_command() {
        let sniffer = ContentSniffer::default();
        assert_eq!(sniffer.sniff("cmd.exe /c dir"), Some(ScriptKind::Command));
    }

    #[test]
    fn test_sniff_javascript() {
        let sniffer = ContentSniffer::default();
        assert_eq!(
            sniffer.sniff("const total = 1;"),
            Some(ScriptKind::JavaScript)
        );
    }

    #[test]
    fn test_sniff_html() {
        let sniffer = ContentSniffer::default();
        assert_eq!(
            sniffer.sniff("<html><body>hi</body></html>"),
            Some(ScriptKind::Html)
        );
    }

    #[test]
    fn test_first_match_wins() {
        // "@echo off" also satisfies the shell `\becho\b` signature, which comes first.
        let sniffer = ContentSniffer::default();
        assert_eq!(sniffer.sniff("@echo off"), Some(ScriptKind::Shell));
    }

    #[test]
    fn test_case_insensitive() {
        let sniffer = ContentSniffer::default();
        assert_eq!(sniffer.sniff("DEF upper(): PASS"), Some(ScriptKind::Python));
    }

    #[test]
    fn test_no_match() {
        let sniffer = ContentSniffer::default();
        assert_eq!(sniffer.sniff("Meeting notes about the budget."), None);
        assert_eq!(sniffer.sniff(""), None);
    }

    #[test]
    fn test_custom_table_order() {
        let table: &[(ScriptKind, &[&str])] = &[
            (ScriptKind::Html, &[r"<body>"]),
            (ScriptKind::JavaScript, &[r"<body>"]),
        ];
        let sniffer = ContentSniffer::with_signatures(table).unwrap();
        assert_eq!(sniffer.sniff("<body>"), Some(ScriptKind::Html));
    }

    #[test]
    fn test_invalid_signature_returns_error() {
        let table: &[(ScriptKind, &[&str])] = &[(ScriptKind::Python, &["[unclosed"])];
        assert!(ContentSniffer::with_signatures(table).is_err());
    }
}
