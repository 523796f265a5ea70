//! State accessor backed by the stock Windows console tools
//!
//! `reg` for configuration values, `sc` for services, `powercfg` for power
//! schemes. Each call is one blocking child process.

use undoable::{
    Error, RegistryData, Result, RunState, ServiceStatus, StartMode, StateAccessor,
    ULTIMATE_TEMPLATE, ULTIMATE_TEMPLATE_NAME, ValueRead,
};

use super::parse::{OutputParser, ParseError};
use crate::runner::{self, CommandOutput};

/// `sc` error for a service that is not installed
const SC_NO_SUCH_SERVICE: &str = "1060";
/// `sc start` on a service that is already running
const SC_ALREADY_RUNNING: &str = "1056";
/// `sc stop` on a service that is not started
const SC_NOT_ACTIVE: &str = "1062";

/// Launches one tool invocation
type Runner = fn(&str, &[&str]) -> std::io::Result<CommandOutput>;

pub struct WindowsAccessor {
    parser: OutputParser,
    runner: Runner,
}

impl WindowsAccessor {
    pub fn new() -> std::result::Result<Self, ParseError> {
        Ok(Self {
            parser: OutputParser::new()?,
            runner: runner::output,
        })
    }

    pub fn parser(&self) -> &OutputParser {
        &self.parser
    }

    /// Run a tool, turning a failure to launch it into `CapabilityUnavailable`
    fn exec(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        (self.runner)(cmd, args)
            .map_err(|e| Error::CapabilityUnavailable(format!("cannot run {cmd}: {e}")))
    }

    /// Listing of `path`, or `None` when the key does not exist.
    ///
    /// Tool messages are localized, so a failed query is never read for its
    /// text: the key is missing only if its parent lists no such subkey.
    fn list_key(&self, path: &str) -> Result<Option<String>> {
        let out = self.exec("reg", &["query", path])?;
        if out.success {
            return Ok(Some(out.stdout));
        }

        let unreadable = || Error::CapabilityUnavailable(format!("{path}: {}", out.combined()));
        let Some((parent, child)) = path.rsplit_once('\\') else {
            return Err(unreadable());
        };
        match self.list_key(parent)? {
            Some(listing)
                if self
                    .parser
                    .subkeys(&listing)
                    .iter()
                    .any(|key| key.eq_ignore_ascii_case(child)) =>
            {
                Err(unreadable())
            }
            _ => Ok(None),
        }
    }

    /// Whether `name` is missing from `path`, judged from key listings
    fn value_absent(&self, path: &str, name: &str) -> Result<bool> {
        Ok(match self.list_key(path)? {
            None => true,
            Some(listing) => !self
                .parser
                .reg_lines(&listing)
                .iter()
                .any(|line| line.name.eq_ignore_ascii_case(name)),
        })
    }
}

fn is_access_denied(out: &CommandOutput) -> bool {
    let text = out.combined();
    text.contains("Access is denied") || text.contains("FAILED 5:")
}

/// Classify a failed write
fn write_error(target: &str, out: &CommandOutput) -> Error {
    if is_access_denied(out) {
        Error::PermissionDenied(target.to_string())
    } else {
        Error::ApplyFailure(format!("{target}: {}", out.combined()))
    }
}

impl StateAccessor for WindowsAccessor {
    fn read_config_value(&self, path: &str, name: &str) -> Result<ValueRead> {
        let out = self.exec("reg", &["query", path, "/v", name])?;
        if !out.success {
            if self.value_absent(path, name)? {
                return Ok(ValueRead::absent());
            }
            return Err(Error::CapabilityUnavailable(format!(
                "{path}\\{name}: {}",
                out.combined()
            )));
        }

        // A successful query means the value exists, parsed or not
        match self.parser.reg_value(&out.stdout, name)? {
            Some(value) => Ok(ValueRead::present(value)),
            None => Err(Error::CapabilityUnavailable(format!(
                "{path}\\{name}: unrecognized reg output"
            ))),
        }
    }

    fn write_config_value(&self, path: &str, name: &str, value: &RegistryData) -> Result<()> {
        let (kind, data) = match value {
            RegistryData::Int(n) => ("REG_DWORD", n.to_string()),
            RegistryData::String(s) => ("REG_SZ", s.clone()),
        };
        let out = self.exec("reg", &["add", path, "/v", name, "/t", kind, "/d", &data, "/f"])?;
        if out.success {
            Ok(())
        } else {
            Err(write_error(&format!("{path}\\{name}"), &out))
        }
    }

    fn remove_config_value(&self, path: &str, name: &str) -> Result<()> {
        let out = self.exec("reg", &["delete", path, "/v", name, "/f"])?;
        if out.success || self.value_absent(path, name)? {
            Ok(())
        } else {
            Err(write_error(&format!("{path}\\{name}"), &out))
        }
    }

    fn read_service_state(&self, name: &str) -> Result<Option<ServiceStatus>> {
        let config = self.exec("sc", &["qc", name])?;
        if !config.success {
            if config.combined().contains(SC_NO_SUCH_SERVICE) {
                return Ok(None);
            }
            return Err(Error::CapabilityUnavailable(format!(
                "service {name}: {}",
                config.combined()
            )));
        }
        let start_mode = self.parser.start_mode(&config.stdout)?;

        let query = self.exec("sc", &["query", name])?;
        if !query.success {
            return Err(Error::CapabilityUnavailable(format!(
                "service {name}: {}",
                query.combined()
            )));
        }
        let run_state = self.parser.run_state(&query.stdout)?;

        Ok(Some(ServiceStatus {
            start_mode,
            run_state,
        }))
    }

    fn set_service_state(
        &self,
        name: &str,
        start_mode: StartMode,
        run_state: RunState,
    ) -> Result<()> {
        let out = self.exec("sc", &["config", name, "start=", start_mode.as_accessor_str()])?;
        if !out.success {
            return Err(write_error(name, &out));
        }

        let (verb, benign) = match run_state {
            RunState::Running => ("start", SC_ALREADY_RUNNING),
            RunState::Stopped => ("stop", SC_NOT_ACTIVE),
        };
        let out = self.exec("sc", &[verb, name])?;
        if out.success || out.combined().contains(benign) {
            Ok(())
        } else {
            Err(write_error(name, &out))
        }
    }

    fn read_active_power_scheme_id(&self) -> Result<Option<String>> {
        let out = self.exec("powercfg", &["/getactivescheme"])?;
        if !out.success {
            return Err(Error::CapabilityUnavailable(format!(
                "active power scheme: {}",
                out.combined()
            )));
        }
        Ok(self.parser.scheme_id(&out.stdout))
    }

    fn set_active_power_scheme_id(&self, id: &str) -> Result<()> {
        let out = self.exec("powercfg", &["/setactive", id])?;
        if out.success {
            Ok(())
        } else {
            Err(write_error(&format!("power scheme {id}"), &out))
        }
    }

    /// Reuses a scheme already instantiated from the template so repeated
    /// runs don't pile up duplicates
    fn create_scheme_from_template(&self, template_id: &str) -> Result<String> {
        let list = self.exec("powercfg", &["/list"])?;
        if list.success {
            let schemes = self.parser.schemes(&list.stdout);
            let existing = schemes.iter().find(|scheme| {
                scheme.id.eq_ignore_ascii_case(template_id)
                    || (template_id.eq_ignore_ascii_case(ULTIMATE_TEMPLATE)
                        && scheme.name.eq_ignore_ascii_case(ULTIMATE_TEMPLATE_NAME))
            });
            if let Some(scheme) = existing {
                log::debug!(
                    "Reusing power scheme {} ({}{})",
                    scheme.id,
                    scheme.name,
                    if scheme.active { ", active" } else { "" }
                );
                return Ok(scheme.id.clone());
            }
        }

        let out = self.exec("powercfg", &["/duplicatescheme", template_id])?;
        if !out.success {
            return Err(write_error(&format!("scheme template {template_id}"), &out));
        }
        self.parser.scheme_id(&out.stdout).ok_or_else(|| {
            Error::ApplyFailure(format!(
                "powercfg did not report a scheme id for template {template_id}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    const APP: &str = r"HKCU\Software\App";
    /// Localized `reg` failure text, never matched on
    const LOCALIZED_FAILURE: &str =
        "FEHLER: Der angegebene Registrierungsschlüssel bzw. Wert wurde nicht gefunden.";

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            code: Some(0),
            success: true,
        }
    }

    fn failed(stderr: &str) -> CommandOutput {
        CommandOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            code: Some(1),
            success: false,
        }
    }

    /// `App` is readable and holds `Present`; `App\Locked` exists but every
    /// query of it fails; `App\Gone` does not exist
    fn fake_reg(cmd: &str, args: &[&str]) -> io::Result<CommandOutput> {
        assert_eq!(cmd, "reg");
        Ok(match args {
            ["query", r"HKCU\Software"] => ok(
                "\r\nHKEY_CURRENT_USER\\Software\r\n\r\nHKEY_CURRENT_USER\\Software\\App\r\n",
            ),
            ["query", r"HKCU\Software\App"] => ok(
                "\r\nHKEY_CURRENT_USER\\Software\\App\r\n    Present    REG_DWORD    0x1\r\n\r\nHKEY_CURRENT_USER\\Software\\App\\Locked\r\n",
            ),
            ["query", r"HKCU\Software\App", "/v", "Present"] => ok(
                "\r\nHKEY_CURRENT_USER\\Software\\App\r\n    Present    REG_DWORD    0x1\r\n",
            ),
            ["query", r"HKCU\Software\App", "/v", "Odd"] => {
                ok("\r\nHKEY_CURRENT_USER\\Software\\App\r\n    (unexpected layout)\r\n")
            }
            _ => failed(LOCALIZED_FAILURE),
        })
    }

    fn accessor() -> WindowsAccessor {
        WindowsAccessor {
            parser: OutputParser::new().unwrap(),
            runner: fake_reg,
        }
    }

    #[test]
    fn test_read_present_value() {
        let read = accessor().read_config_value(APP, "Present").unwrap();
        assert_eq!(read, ValueRead::present(RegistryData::Int(1)));
    }

    #[test]
    fn test_absent_value_without_matching_error_text() {
        let host = accessor();
        assert_eq!(
            host.read_config_value(APP, "Missing").unwrap(),
            ValueRead::absent()
        );
        assert_eq!(
            host.read_config_value(&format!(r"{APP}\Gone"), "Anything").unwrap(),
            ValueRead::absent()
        );
    }

    #[test]
    fn test_unreadable_key_is_not_absent() {
        let err = accessor()
            .read_config_value(&format!(r"{APP}\Locked"), "Anything")
            .unwrap_err();
        assert!(matches!(err, Error::CapabilityUnavailable(_)));
    }

    #[test]
    fn test_successful_query_without_value_line_is_unavailable() {
        let err = accessor().read_config_value(APP, "Odd").unwrap_err();
        assert!(matches!(err, Error::CapabilityUnavailable(_)));
    }

    #[test]
    fn test_remove_missing_value_succeeds() {
        let host = accessor();
        host.remove_config_value(APP, "Missing").unwrap();
        host.remove_config_value(&format!(r"{APP}\Gone"), "Anything").unwrap();

        let err = host
            .remove_config_value(&format!(r"{APP}\Locked"), "Anything")
            .unwrap_err();
        assert!(matches!(err, Error::CapabilityUnavailable(_)));
    }

    #[test]
    fn test_write_error_classification() {
        let denied = write_error("HKLM\\X\\Y", &failed("ERROR: Access is denied.\r\n"));
        assert!(matches!(denied, Error::PermissionDenied(_)));

        let sc_denied = write_error(
            "DiagTrack",
            &failed("[SC] OpenService FAILED 5:\n\nAccess is denied."),
        );
        assert!(matches!(sc_denied, Error::PermissionDenied(_)));

        let other = write_error("HKLM\\X\\Y", &failed("ERROR: Invalid syntax."));
        match other {
            Error::ApplyFailure(msg) => assert!(msg.contains("Invalid syntax")),
            e => panic!("unexpected {e:?}"),
        }
    }
}
