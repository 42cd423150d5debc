//! Command-line argument parsing.
//!
//! Usage:
//!   automac [-L<dir>] [-q] [-c<cmd>] [<script.txt>]

use std::path::PathBuf;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Script library directory override (`-L<dir>`).
    pub lib_dir: Option<PathBuf>,
    /// Suppress script output lines (`-q`); errors still print.
    pub quiet: bool,
    /// Inline command string to run instead of a file (`-c<cmd>`).
    pub command: Option<String>,
    /// Script file to execute.
    pub script: Option<PathBuf>,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(&raw[1..])
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // Non-flag argument.
        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'q' => args.quiet = true,

                // -L<dir>
                'L' => {
                    let dir = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-L requires a directory argument".to_owned());
                    };
                    args.lib_dir = Some(PathBuf::from(dir));
                }

                // -c<cmd>
                'c' => {
                    let cmd = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-c requires a command argument".to_owned());
                    };
                    args.command = Some(cmd);
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => {}
        1 => args.script = Some(PathBuf::from(&positional[0])),
        _ => return Err(format!("unexpected argument: {}", positional[1])),
    }

    if args.command.is_none() && args.script.is_none() {
        return Err("a script file (or -c <cmd>) is required".to_owned());
    }

    Ok(args)
}

/// Resolve the script library directory used for relative sub-script paths.
///
/// Priority: `-L` override, then `$AUTOMAC_LIBDIR`, then the per-user data
/// directory.
pub fn resolve_lib_dir(cli_override: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(dir) = cli_override {
        return Some(dir.clone());
    }
    if let Ok(dir) = std::env::var("AUTOMAC_LIBDIR") {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    directories::ProjectDirs::from("", "", "automac")
        .map(|dirs| dirs.data_dir().join("scripts"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn script_path_positional() {
        let a = parse_argv(&argv(&["macro.txt"])).unwrap();
        assert_eq!(a.script, Some(PathBuf::from("macro.txt")));
        assert!(!a.quiet);
    }

    #[test]
    fn quiet_flag() {
        let a = parse_argv(&argv(&["-q", "macro.txt"])).unwrap();
        assert!(a.quiet);
    }

    #[test]
    fn libdir_embedded_and_separate() {
        let a = parse_argv(&argv(&["-L/tmp/lib", "macro.txt"])).unwrap();
        assert_eq!(a.lib_dir, Some(PathBuf::from("/tmp/lib")));
        let a = parse_argv(&argv(&["-L", "/tmp/lib", "macro.txt"])).unwrap();
        assert_eq!(a.lib_dir, Some(PathBuf::from("/tmp/lib")));
    }

    #[test]
    fn inline_command_needs_no_script() {
        let a = parse_argv(&argv(&["-c", "log hi"])).unwrap();
        assert_eq!(a.command.as_deref(), Some("log hi"));
        assert_eq!(a.script, None);
    }

    #[test]
    fn combined_flags() {
        let a = parse_argv(&argv(&["-qL/tmp/lib", "macro.txt"])).unwrap();
        assert!(a.quiet);
        assert_eq!(a.lib_dir, Some(PathBuf::from("/tmp/lib")));
    }

    #[test]
    fn missing_script_is_error() {
        assert!(parse_argv(&argv(&[])).is_err());
        assert!(parse_argv(&argv(&["-q"])).is_err());
    }

    #[test]
    fn unknown_flag_is_error() {
        assert!(parse_argv(&argv(&["-z", "macro.txt"])).is_err());
    }

    #[test]
    fn double_dash_ends_flags() {
        let a = parse_argv(&argv(&["--", "-weird-name.txt"])).unwrap();
        assert_eq!(a.script, Some(PathBuf::from("-weird-name.txt")));
    }

    #[test]
    fn extra_positional_is_error() {
        assert!(parse_argv(&argv(&["a.txt", "b.txt"])).is_err());
    }
}
