use clap::{CommandFactory, Parser};
use clap_complete::generate;
use lank::cli::{Args, ColorChoice, Commands};
use lank::diagnostic::render_diagnostics;
use lank::interpreter::Interpreter;
use owo_colors::OwoColorize;
use std::io;

struct AppConfig {
    color_enabled: bool,
    verbose: bool,
}

impl AppConfig {
    fn from_args(args: &Args) -> Self {
        let color_enabled = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stderr) && atty::is(atty::Stream::Stdout),
        };

        AppConfig {
            color_enabled,
            verbose: args.verbose,
        }
    }
}

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);

    let Some(script) = args.script else {
        // clap enforces the positional; unreachable without it.
        error_message(&config, "expected exactly one script path");
        std::process::exit(2);
    };

    verbose_log(&config, &format!("Reading script {}", script.display()));

    let source = match std::fs::read_to_string(&script) {
        Ok(text) => text,
        Err(error) => {
            error_message(
                &config,
                &format!("Failed to read {}: {}", script.display(), error),
            );
            std::process::exit(1);
        }
    };

    let file_name = script.display().to_string();
    let mut interpreter = Interpreter::for_script(&script);

    verbose_log(&config, "Evaluating");

    match interpreter.exec(&source) {
        Ok(value) => {
            println!("Program returned '{}'", value);
        }
        Err(diagnostics) => {
            let rendered = render_diagnostics(&source, &file_name, &diagnostics, config.color_enabled);
            eprint!("{}", rendered);
            std::process::exit(1);
        }
    }
}

fn generate_completions(shell: clap_complete::Shell) {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, &bin_name, &mut io::stdout());
}

fn verbose_log(config: &AppConfig, message: &str) {
    if config.verbose {
        eprintln!("[lank:debug] {}", message);
    }
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
