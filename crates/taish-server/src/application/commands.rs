//! Command table and handlers.
//!
//! A command line is split into tokens; the first names the command, the rest
//! are its arguments.  Handlers write normal output into the response buffer
//! and return a [`CommandError`] for anything the operator should see as an
//! error.  [`execute`] turns that error into a single `%% ` line, so a handler
//! never formats error lines itself.

use std::fmt::Write as _;

use taish_core::{
    parse_netif_attr, ApiCategory, AttrError, CommandStatus, LogLevel, NetifAttrId, ObjectId,
    ERROR_PREFIX,
};
use thiserror::Error;
use tracing::debug;

use super::shell::{Shell, ShellError};

/// Command-level failures.  Reported to the operator; the session continues.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command({0}) was specified")]
    Unknown(String),

    #[error("Invalid parameters (usage: {0})")]
    Usage(&'static str),

    #[error("Invalid module ID `{0}`")]
    ModuleId(String),

    #[error("Invalid argument `{0}` (unspecified, module, hostif or networkif)")]
    Category(String),

    #[error("Invalid log-level({0}) was specified (debug, info, notice, warn, error or critical)")]
    LogLevel(String),

    #[error(transparent)]
    Attribute(#[from] AttrError),

    #[error(transparent)]
    Shell(#[from] ShellError),
}

/// What the session does after a successful command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Terminate,
}

type Handler = fn(&mut Shell, &[&str], &mut String) -> Result<Outcome, CommandError>;

/// One entry of the command table.
pub struct Command {
    pub name: &'static str,
    pub help: &'static str,
    handler: Handler,
}

static COMMANDS: &[Command] = &[
    Command { name: "?", help: "show help messages for all commands", handler: cmd_help },
    Command { name: "help", help: "show help messages for all commands", handler: cmd_help },
    Command { name: "load", help: "load a vendor backend: Usage: load <backend>", handler: cmd_load },
    Command { name: "init", help: "initialize the vendor API: Usage: init", handler: cmd_init },
    Command { name: "quit", help: "quit this session", handler: cmd_quit },
    Command { name: "exit", help: "exit this session", handler: cmd_quit },
    Command {
        name: "logset",
        help: "set vendor log level: Usage: logset <unspecified|module|hostif|networkif> <debug|info|notice|warn|error|critical>",
        handler: cmd_logset,
    },
    Command {
        name: "set_netif_attr",
        help: "set a network interface attribute: Usage: set_netif_attr <module-id> <attr-id> <attr-val>",
        handler: cmd_set_netif_attr,
    },
    Command { name: "module_list", help: "show the module IDs", handler: cmd_module_list },
];

/// All commands, in help order.
pub fn commands() -> &'static [Command] {
    COMMANDS
}

pub fn lookup(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// Runs one command line against `shell`, appending the response to `out`.
///
/// A blank line is a successful no-op.  The prompt is not written here.
pub fn execute(shell: &mut Shell, line: &str, out: &mut String) -> CommandStatus {
    let tokens = taish_core::tokenize(line);
    let Some((&name, args)) = tokens.split_first() else {
        return CommandStatus::Success;
    };
    debug!("command: {name} {args:?}");

    let result = match lookup(name) {
        Some(command) => (command.handler)(shell, args, out),
        None => Err(CommandError::Unknown(name.to_string())),
    };

    match result {
        Ok(Outcome::Continue) => CommandStatus::Success,
        Ok(Outcome::Terminate) => CommandStatus::Terminate,
        Err(e) => {
            let _ = writeln!(out, "{ERROR_PREFIX}{e}");
            CommandStatus::Error
        }
    }
}

fn cmd_help(_shell: &mut Shell, _args: &[&str], out: &mut String) -> Result<Outcome, CommandError> {
    for command in COMMANDS {
        let _ = writeln!(out, "{:<14}: {}", command.name, command.help);
    }
    Ok(Outcome::Continue)
}

fn cmd_load(shell: &mut Shell, args: &[&str], _out: &mut String) -> Result<Outcome, CommandError> {
    let [backend] = args else {
        return Err(CommandError::Usage("load <backend>"));
    };
    shell.load(backend)?;
    Ok(Outcome::Continue)
}

fn cmd_init(shell: &mut Shell, args: &[&str], _out: &mut String) -> Result<Outcome, CommandError> {
    if !args.is_empty() {
        return Err(CommandError::Usage("init"));
    }
    shell.init()?;
    Ok(Outcome::Continue)
}

fn cmd_quit(_shell: &mut Shell, _args: &[&str], _out: &mut String) -> Result<Outcome, CommandError> {
    Ok(Outcome::Terminate)
}

fn cmd_logset(shell: &mut Shell, args: &[&str], _out: &mut String) -> Result<Outcome, CommandError> {
    let [category, level] = args else {
        return Err(CommandError::Usage("logset <category> <level>"));
    };
    if !shell.is_loaded() {
        return Err(ShellError::NotLoaded.into());
    }
    let category: ApiCategory = category
        .parse()
        .map_err(|_| CommandError::Category(category.to_string()))?;
    let level: LogLevel = level
        .parse()
        .map_err(|_| CommandError::LogLevel(level.to_string()))?;
    shell.set_log_level(category, level)?;
    Ok(Outcome::Continue)
}

fn cmd_set_netif_attr(
    shell: &mut Shell,
    args: &[&str],
    out: &mut String,
) -> Result<Outcome, CommandError> {
    if args.is_empty() {
        write_set_netif_attr_usage(out);
        return Err(CommandError::Usage("set_netif_attr <module-id> <attr-id> <attr-val>"));
    }
    let [module, name, value] = args else {
        return Err(CommandError::Usage("set_netif_attr <module-id> <attr-id> <attr-val>"));
    };

    let module = parse_module_id(module)?;
    shell.ensure_module(module)?;
    let attr = parse_netif_attr(name, value)?;
    shell.set_netif_attribute(module, attr)?;
    Ok(Outcome::Continue)
}

fn cmd_module_list(shell: &mut Shell, args: &[&str], out: &mut String) -> Result<Outcome, CommandError> {
    if !args.is_empty() {
        return Err(CommandError::Usage("module_list"));
    }
    let _ = writeln!(out, "Module List");
    for (location, id) in shell.module_list() {
        let _ = writeln!(out, "location: {location}  module ID: {id}");
    }
    Ok(Outcome::Continue)
}

/// Decimal, or hexadecimal with a `0x` prefix.
fn parse_module_id(text: &str) -> Result<ObjectId, CommandError> {
    let parsed = match text.strip_prefix("0x") {
        Some(hex) => ObjectId::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| CommandError::ModuleId(text.to_string()))
}

fn write_set_netif_attr_usage(out: &mut String) {
    let names: Vec<&str> = NetifAttrId::ALL.iter().map(|id| id.name()).collect();
    let _ = writeln!(out, "Usage: set_netif_attr <module-id> <attr-id> <attr-val>");
    let _ = writeln!(out, "    <module-id>: integer.");
    let _ = writeln!(out, "    <attr-id>  : {}.", names.join(", "));
    let _ = writeln!(out, "    <attr-val> :");
    for id in NetifAttrId::ALL {
        let _ = writeln!(out, "        {}: {}", id.name(), id.expected());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{
        expect_module, initialized_shell, silent_presence, OnceLoader,
    };
    use std::sync::Arc;
    use taish_core::{MockTransponderApi, NetifAttr, PresenceEvent};

    fn run(shell: &mut Shell, line: &str) -> (CommandStatus, String) {
        let mut out = String::new();
        let status = execute(shell, line, &mut out);
        (status, out)
    }

    fn unloaded_shell() -> Shell {
        Shell::new(
            Arc::new(OnceLoader::new("mock", MockTransponderApi::new())),
            silent_presence(),
        )
    }

    /// Initialized shell with one module (id 16) at `1-1` and two netifs.
    fn shell_with_module(mut api: MockTransponderApi) -> Shell {
        expect_module(&mut api, "1-1", 0x10, 2);
        let mut shell = initialized_shell(api);
        shell
            .handle_presence(vec![PresenceEvent::new(true, "1-1")])
            .unwrap();
        shell
    }

    #[test]
    fn test_table_has_every_command() {
        for name in ["?", "help", "load", "init", "quit", "exit", "logset", "set_netif_attr", "module_list"] {
            assert!(lookup(name).is_some(), "missing command {name}");
        }
    }

    #[test]
    fn test_blank_line_is_success_without_output() {
        let mut shell = unloaded_shell();
        let (status, out) = run(&mut shell, "  \r");
        assert_eq!(status, CommandStatus::Success);
        assert!(out.is_empty());
    }

    #[test]
    fn test_unknown_command_is_reported_not_fatal() {
        // Arrange
        let mut shell = unloaded_shell();

        // Act
        let (status, out) = run(&mut shell, "frobnicate now");

        // Assert
        assert_eq!(status, CommandStatus::Error);
        assert_eq!(out, "%% unknown command(frobnicate) was specified\n");
    }

    #[test]
    fn test_help_prints_one_line_per_command() {
        let mut shell = unloaded_shell();
        let (status, out) = run(&mut shell, "help");
        assert_eq!(status, CommandStatus::Success);
        assert_eq!(out.lines().count(), commands().len());
        assert!(out.contains("set_netif_attr"));
    }

    #[test]
    fn test_quit_and_exit_terminate() {
        let mut shell = unloaded_shell();
        assert_eq!(run(&mut shell, "quit").0, CommandStatus::Terminate);
        assert_eq!(run(&mut shell, "exit\r").0, CommandStatus::Terminate);
        assert_eq!(CommandStatus::Terminate.code(), -10);
    }

    #[test]
    fn test_load_without_argument_is_usage_error() {
        let mut shell = unloaded_shell();
        let (status, out) = run(&mut shell, "load");
        assert_eq!(status, CommandStatus::Error);
        assert!(out.starts_with("%% Invalid parameters"));
    }

    #[test]
    fn test_init_before_load_is_reported() {
        let mut shell = unloaded_shell();
        let (status, out) = run(&mut shell, "init");
        assert_eq!(status, CommandStatus::Error);
        assert_eq!(out, "%% Need to load TAI library at first\n");
    }

    #[test]
    fn test_logset_rejects_unknown_category_and_level() {
        // Arrange: loaded, but any vendor call would panic
        let mut shell = unloaded_shell();
        shell.load("mock").unwrap();

        // Act
        let (bad_category, category_out) = run(&mut shell, "logset chassis debug");
        let (bad_level, level_out) = run(&mut shell, "logset module verbose");

        // Assert
        assert_eq!(bad_category, CommandStatus::Error);
        assert!(category_out.contains("chassis"));
        assert_eq!(bad_level, CommandStatus::Error);
        assert!(level_out.contains("log-level(verbose)"));
        assert_eq!(shell.log_level(ApiCategory::Module), LogLevel::Info);
    }

    #[test]
    fn test_logset_stores_and_pushes_level() {
        let mut api = MockTransponderApi::new();
        api.expect_log_set()
            .withf(|c, l| *c == ApiCategory::HostInterface && *l == LogLevel::Critical)
            .times(1)
            .returning(|_, _| Ok(()));
        let mut shell = Shell::new(Arc::new(OnceLoader::new("mock", api)), silent_presence());
        shell.load("mock").unwrap();

        let (status, _) = run(&mut shell, "logset hostif critical");

        assert_eq!(status, CommandStatus::Success);
        assert_eq!(shell.log_level(ApiCategory::HostInterface), LogLevel::Critical);
    }

    #[test]
    fn test_set_netif_attr_without_arguments_prints_usage() {
        let mut shell = unloaded_shell();

        let (status, out) = run(&mut shell, "set_netif_attr");

        assert_eq!(status, CommandStatus::Error);
        assert!(out.starts_with("Usage: set_netif_attr"));
        assert!(out.contains("tx-grid: 100, 50, 33, 25, 12.5 or 6.25"));
        assert_eq!(out.lines().filter(|l| l.starts_with("%% ")).count(), 1);
    }

    #[test]
    fn test_set_netif_attr_wrong_arity_is_reported() {
        let mut shell = unloaded_shell();
        let (status, out) = run(&mut shell, "set_netif_attr 3 tx-enable");
        assert_eq!(status, CommandStatus::Error);
        assert!(out.starts_with("%% Invalid parameters"));
    }

    #[test]
    fn test_set_netif_attr_unknown_module_makes_no_vendor_call() {
        // Arrange: no set expectation, so a vendor call would panic
        let mut shell = shell_with_module(MockTransponderApi::new());

        // Act
        let (status, out) = run(&mut shell, "set_netif_attr 3 tx-enable true");

        // Assert
        assert_eq!(status, CommandStatus::Error);
        assert_eq!(out, "%% Invalid module ID 3\n");
    }

    #[test]
    fn test_set_netif_attr_non_numeric_module_id_is_reported() {
        let mut shell = shell_with_module(MockTransponderApi::new());
        let (status, out) = run(&mut shell, "set_netif_attr one tx-enable true");
        assert_eq!(status, CommandStatus::Error);
        assert!(out.contains("Invalid module ID `one`"));
    }

    #[test]
    fn test_set_netif_attr_out_of_vocabulary_grid_is_rejected() {
        let mut shell = shell_with_module(MockTransponderApi::new());

        let (status, out) = run(&mut shell, "set_netif_attr 16 tx-grid 17");

        assert_eq!(status, CommandStatus::Error);
        assert!(out.starts_with("%% Invalid argument `17` for tx-grid"));
    }

    #[test]
    fn test_set_netif_attr_unknown_attribute_is_rejected() {
        let mut shell = shell_with_module(MockTransponderApi::new());
        let (status, out) = run(&mut shell, "set_netif_attr 16 tx-color blue");
        assert_eq!(status, CommandStatus::Error);
        assert!(out.starts_with("%% Invalid attribute `tx-color`"));
    }

    #[test]
    fn test_set_netif_attr_applies_to_all_netifs() {
        // Arrange
        let mut api = MockTransponderApi::new();
        api.expect_set_network_interface_attributes()
            .withf(|_, attrs| attrs == [NetifAttr::TxChannel(42)])
            .times(2)
            .returning(|_, _| Ok(()));
        let mut shell = shell_with_module(api);

        // Act
        let (status, out) = run(&mut shell, "set_netif_attr 0x10 tx-channel 42");

        // Assert
        assert_eq!(status, CommandStatus::Success);
        assert!(out.is_empty());
    }

    #[test]
    fn test_set_netif_attr_vendor_failure_is_reported() {
        let mut api = MockTransponderApi::new();
        api.expect_set_network_interface_attributes()
            .returning(|netif, _| Err(taish_core::ApiError::InvalidObject(netif)));
        let mut shell = shell_with_module(api);

        let (status, out) = run(&mut shell, "set_netif_attr 16 tx-enable false");

        assert_eq!(status, CommandStatus::Error);
        assert!(out.starts_with("%% failed to set network interface attribute"));
    }

    #[test]
    fn test_module_list_prints_entries_in_discovery_order() {
        // Arrange
        let mut api = MockTransponderApi::new();
        expect_module(&mut api, "1-2", 0x20, 1);
        expect_module(&mut api, "1-1", 0x10, 1);
        let mut shell = initialized_shell(api);
        shell
            .handle_presence(vec![
                PresenceEvent::new(true, "1-2"),
                PresenceEvent::new(true, "1-1"),
            ])
            .unwrap();

        // Act
        let (status, out) = run(&mut shell, "module_list");

        // Assert
        assert_eq!(status, CommandStatus::Success);
        assert_eq!(
            out,
            "Module List\nlocation: 1-2  module ID: 32\nlocation: 1-1  module ID: 16\n"
        );
    }

    #[test]
    fn test_module_list_with_arguments_is_usage_error() {
        let mut shell = unloaded_shell();
        let (status, out) = run(&mut shell, "module_list all");
        assert_eq!(status, CommandStatus::Error);
        assert_eq!(out, "%% Invalid parameters (usage: module_list)\n");
    }

    #[test]
    fn test_module_id_accepts_decimal_and_hex() {
        assert_eq!(parse_module_id("16").unwrap(), 16);
        assert_eq!(parse_module_id("0x10").unwrap(), 16);
        assert!(parse_module_id("-1").is_err());
    }
}
