//! Parsers for `reg`, `sc` and `powercfg` console output

use regex::Regex;
use thiserror::Error;
use undoable::{RegistryData, RunState, StartMode};

/// Output from a system tool could not be understood
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid output pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{tool} output has no {field}")]
    Missing {
        tool: &'static str,
        field: &'static str,
    },

    #[error("unsupported registry type {0}")]
    UnsupportedType(String),

    #[error("cannot read {kind} data '{data}'")]
    BadData { kind: String, data: String },

    #[error("unsupported start type {0}")]
    StartType(String),
}

impl From<ParseError> for undoable::Error {
    fn from(e: ParseError) -> Self {
        undoable::Error::CapabilityUnavailable(e.to_string())
    }
}

/// One value line of `reg query` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegLine {
    pub name: String,
    pub kind: String,
    pub data: String,
}

/// One scheme line of `powercfg /list` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerScheme {
    pub id: String,
    pub name: String,
    pub active: bool,
}

/// Compiled patterns for every tool we read from
#[derive(Debug)]
pub struct OutputParser {
    reg_line: Regex,
    start_type: Regex,
    state: Regex,
    guid: Regex,
    scheme_line: Regex,
}

impl OutputParser {
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            reg_line: Regex::new(r"^\s+(.+?)\s{4}(REG_[A-Z_]+)(?:\s{4}(.*))?$")?,
            start_type: Regex::new(r"START_TYPE\s*:\s*\d+\s+([A-Z_]+)(\s+\(DELAYED\))?")?,
            state: Regex::new(r"STATE\s*:\s*\d+\s+([A-Z_]+)")?,
            guid: Regex::new(
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
            )?,
            scheme_line: Regex::new(
                r"GUID:\s*([0-9a-fA-F-]{36})\s+\((.*?)\)\s*(\*)?",
            )?,
        })
    }

    // ========================================================================
    // reg
    // ========================================================================

    /// Every value line in `reg query <key>` output. Only a stray `\r` is
    /// stripped; trailing spaces belong to the data.
    pub fn reg_lines(&self, stdout: &str) -> Vec<RegLine> {
        stdout
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter_map(|line| self.reg_line.captures(line))
            .map(|caps| RegLine {
                name: caps[1].to_string(),
                kind: caps[2].to_string(),
                data: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
            })
            .collect()
    }

    /// Typed data of `name` in `reg query <key> /v <name>` output
    pub fn reg_value(&self, stdout: &str, name: &str) -> Result<Option<RegistryData>, ParseError> {
        self.reg_lines(stdout)
            .into_iter()
            .find(|line| line.name.eq_ignore_ascii_case(name))
            .map(|line| registry_data(&line))
            .transpose()
    }

    /// Last path component of each subkey listed in `reg query <key>` output
    pub fn subkeys(&self, stdout: &str) -> Vec<String> {
        stdout
            .lines()
            .filter(|line| line.starts_with("HKEY_"))
            // the first key line is the queried key itself
            .skip(1)
            .filter_map(|line| line.trim_end().rsplit('\\').next())
            .map(str::to_string)
            .collect()
    }

    // ========================================================================
    // sc
    // ========================================================================

    /// Start mode from `sc qc <name>` output
    pub fn start_mode(&self, stdout: &str) -> Result<StartMode, ParseError> {
        let caps = self.start_type.captures(stdout).ok_or(ParseError::Missing {
            tool: "sc qc",
            field: "START_TYPE",
        })?;
        let mode = caps[1]
            .parse::<StartMode>()
            .map_err(|_| ParseError::StartType(caps[1].to_string()))?;
        Ok(match mode {
            StartMode::Automatic if caps.get(2).is_some() => StartMode::AutomaticDelayed,
            other => other,
        })
    }

    /// Run state from `sc query <name>` output; pending states count as
    /// where they are heading
    pub fn run_state(&self, stdout: &str) -> Result<RunState, ParseError> {
        let caps = self.state.captures(stdout).ok_or(ParseError::Missing {
            tool: "sc query",
            field: "STATE",
        })?;
        Ok(match &caps[1] {
            "RUNNING" | "START_PENDING" | "CONTINUE_PENDING" => RunState::Running,
            _ => RunState::Stopped,
        })
    }

    // ========================================================================
    // powercfg
    // ========================================================================

    /// First scheme GUID in `powercfg /getactivescheme` or `/duplicatescheme` output
    pub fn scheme_id(&self, stdout: &str) -> Option<String> {
        self.guid
            .find(stdout)
            .map(|m| m.as_str().to_ascii_lowercase())
    }

    /// Schemes in `powercfg /list` output
    pub fn schemes(&self, stdout: &str) -> Vec<PowerScheme> {
        self.scheme_line
            .captures_iter(stdout)
            .map(|caps| PowerScheme {
                id: caps[1].to_ascii_lowercase(),
                name: caps[2].trim().to_string(),
                active: caps.get(3).is_some(),
            })
            .collect()
    }
}

fn registry_data(line: &RegLine) -> Result<RegistryData, ParseError> {
    match line.kind.as_str() {
        "REG_DWORD" => {
            let digits = line
                .data
                .trim()
                .trim_start_matches("0x")
                .trim_start_matches("0X");
            u32::from_str_radix(digits, 16)
                .map(RegistryData::Int)
                .map_err(|_| ParseError::BadData {
                    kind: line.kind.clone(),
                    data: line.data.clone(),
                })
        }
        // REG_EXPAND_SZ has no typed counterpart; writing it back as REG_SZ
        // would drop the expansion
        "REG_SZ" => Ok(RegistryData::String(line.data.clone())),
        other => Err(ParseError::UnsupportedType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> OutputParser {
        OutputParser::new().unwrap()
    }

    #[test]
    fn test_reg_dword_value() {
        let out = "\r\nHKEY_CURRENT_USER\\Software\\Microsoft\\Windows\\CurrentVersion\\Explorer\\Advanced\r\n    TaskbarDa    REG_DWORD    0x1\r\n\r\n";
        assert_eq!(
            parser().reg_value(out, "TaskbarDa").unwrap(),
            Some(RegistryData::Int(1))
        );
        assert_eq!(parser().reg_value(out, "HideFileExt").unwrap(), None);
    }

    #[test]
    fn test_reg_large_dword() {
        let out = "HKEY_CURRENT_USER\\X\n    Mask    REG_DWORD    0xffffffff\n";
        assert_eq!(
            parser().reg_value(out, "mask").unwrap(),
            Some(RegistryData::Int(u32::MAX))
        );
    }

    #[test]
    fn test_reg_string_values() {
        let out = "HKEY_CURRENT_USER\\Software\\Microsoft\\Windows\\CurrentVersion\\Run\n    OneDrive    REG_SZ    \"C:\\Program Files\\Microsoft OneDrive\\OneDrive.exe\" /background\n    Empty    REG_SZ\n";
        let lines = parser().reg_lines(out);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "OneDrive");
        assert!(lines[0].data.ends_with("/background"));
        assert_eq!(
            parser().reg_value(out, "Empty").unwrap(),
            Some(RegistryData::String(String::new()))
        );
    }

    #[test]
    fn test_reg_unsupported_type() {
        let out = "HKEY_CURRENT_USER\\X\n    Blob    REG_BINARY    00FF\n";
        assert!(matches!(
            parser().reg_value(out, "Blob"),
            Err(ParseError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_reg_string_keeps_trailing_spaces() {
        let out = "HKEY_CURRENT_USER\\X\r\n    Pad    REG_SZ    abc  \r\n";
        assert_eq!(
            parser().reg_value(out, "Pad").unwrap(),
            Some(RegistryData::String("abc  ".into()))
        );
    }

    #[test]
    fn test_reg_expand_sz_is_not_captured() {
        let out = "HKEY_CURRENT_USER\\Environment\n    Path    REG_EXPAND_SZ    %USERPROFILE%\\bin\n";
        assert!(matches!(
            parser().reg_value(out, "Path"),
            Err(ParseError::UnsupportedType(kind)) if kind == "REG_EXPAND_SZ"
        ));
    }

    #[test]
    fn test_reg_subkeys() {
        let out = "\r\nHKEY_CURRENT_USER\\Software\\Policies\r\n    Flag    REG_DWORD    0x0\r\n\r\nHKEY_CURRENT_USER\\Software\\Policies\\Microsoft\r\nHKEY_CURRENT_USER\\Software\\Policies\\Google\r\n";
        assert_eq!(parser().subkeys(out), vec!["Microsoft", "Google"]);
    }

    #[test]
    fn test_sc_qc_start_type() {
        let out = "[SC] QueryServiceConfig SUCCESS\n\nSERVICE_NAME: WSearch\n        TYPE               : 10  WIN32_OWN_PROCESS\n        START_TYPE         : 2   AUTO_START  (DELAYED)\n        ERROR_CONTROL      : 1   NORMAL\n";
        assert_eq!(parser().start_mode(out).unwrap(), StartMode::AutomaticDelayed);

        let out = "        START_TYPE         : 2   AUTO_START\n";
        assert_eq!(parser().start_mode(out).unwrap(), StartMode::Automatic);

        let out = "        START_TYPE         : 3   DEMAND_START\n";
        assert_eq!(parser().start_mode(out).unwrap(), StartMode::Manual);

        let out = "        START_TYPE         : 4   DISABLED\n";
        assert_eq!(parser().start_mode(out).unwrap(), StartMode::Disabled);

        let out = "        START_TYPE         : 0   BOOT_START\n";
        assert!(matches!(
            parser().start_mode(out),
            Err(ParseError::StartType(_))
        ));
    }

    #[test]
    fn test_sc_query_state() {
        let out = "SERVICE_NAME: DiagTrack\n        TYPE               : 10  WIN32_OWN_PROCESS\n        STATE              : 4  RUNNING\n                                (STOPPABLE, NOT_PAUSABLE, ACCEPTS_SHUTDOWN)\n";
        assert_eq!(parser().run_state(out).unwrap(), RunState::Running);

        let out = "        STATE              : 1  STOPPED\n";
        assert_eq!(parser().run_state(out).unwrap(), RunState::Stopped);

        assert!(parser().run_state("garbage").is_err());
    }

    #[test]
    fn test_powercfg_active_scheme() {
        let out = "Power Scheme GUID: 381B4222-F694-41F0-9685-FF5BB260DF2E  (Balanced)";
        assert_eq!(
            parser().scheme_id(out).as_deref(),
            Some("381b4222-f694-41f0-9685-ff5bb260df2e")
        );
        assert_eq!(parser().scheme_id("no scheme here"), None);
    }

    #[test]
    fn test_powercfg_list() {
        let out = "\nExisting Power Schemes (* Active)\n-----------------------------------\nPower Scheme GUID: 381b4222-f694-41f0-9685-ff5bb260df2e  (Balanced) *\nPower Scheme GUID: 8c5e7fda-e8bf-4a96-9a85-a6e23a8c635c  (High performance)\nPower Scheme GUID: 5b9b1e3a-5f73-4c0b-9d2f-0e6c7f1a2b3c  (Ultimate Performance)\n";
        let schemes = parser().schemes(out);
        assert_eq!(schemes.len(), 3);
        assert!(schemes[0].active);
        assert!(!schemes[1].active);
        assert_eq!(schemes[2].name, "Ultimate Performance");
    }
}
