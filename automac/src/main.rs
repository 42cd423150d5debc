use std::sync::Arc;

use automac::actions::NullActions;
use automac::cli;
use automac::manager::ScriptManager;
use automac::script::{Interpreter, OutputSink, PopupSink, RunState, StatusSink};

const USAGE: &str = "Usage: automac [-L <dir>] [-q] [-c <cmd>] [<script.txt>]";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("automac: {e}");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    // ── Load the script source ────────────────────────────────────────────────
    let source = match (&args.command, &args.script) {
        (Some(cmd), _) => cmd.clone(),
        (None, Some(path)) => {
            let mut manager = ScriptManager::new();
            match manager.load(path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("automac: cannot read {}: {e}", path.display());
                    std::process::exit(2);
                }
            }
        }
        (None, None) => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    // ── Wire the sinks ────────────────────────────────────────────────────────
    let quiet = args.quiet;
    let output: OutputSink = Arc::new(move |line: &str| {
        if !quiet {
            println!("{line}");
        }
    });
    let status: StatusSink = Arc::new(|text: &str| tracing::info!("status: {text}"));
    let popup: PopupSink = Arc::new(|message: &str| println!("[popup] {message}"));

    let mut interp = Interpreter::new(Arc::new(NullActions), output, status, popup);
    if let Some(dir) = cli::resolve_lib_dir(args.lib_dir.as_ref()) {
        interp = interp.with_lib_dir(dir);
    }

    // ── Run on a worker thread; Ctrl-C requests a cooperative stop ────────────
    let stop = interp.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || stop.request_stop()) {
        tracing::warn!("cannot install Ctrl-C handler: {e}");
    }

    let worker = std::thread::spawn(move || interp.run(&source));
    let state = match worker.join() {
        Ok(state) => state,
        Err(_) => {
            eprintln!("automac: script thread panicked");
            std::process::exit(1);
        }
    };

    std::process::exit(match state {
        RunState::FinishedNormally | RunState::StoppedByExit => 0,
        RunState::StoppedByUser => 130,
        RunState::FinishedWithError | RunState::Running => 1,
    });
}
