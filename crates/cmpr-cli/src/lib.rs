//! `cmpr`: tiles project source files into navigable comment/code blocks
//! and mediates between the user, an editor, a build command, and an LLM
//! code generator (§2 SYSTEM OVERVIEW).

pub mod app;
pub mod args;
pub mod batch;
pub mod init;
pub mod loader;
pub mod prompt;
pub mod render;
pub mod startup;

use anyhow::Result;
use args::Args;
use clap::Parser;
use cmpr_config::Config;
use prompt::StdinPrompter;
use startup::AppStartup;
use std::path::PathBuf;

/// Chat completions endpoint (§6 "Wire format").
pub const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// The small configured set of model identifiers offered by `:model`
/// (§4.5 "Dispatch").
pub const MODEL_OPTIONS: &[&str] = &["gpt-3.5-turbo", "gpt-4-turbo", "clipboard"];

pub fn run() -> Result<()> {
    let args = Args::parse();
    let conf_path = args
        .conf
        .clone()
        .unwrap_or_else(cmpr_config::default_config_path);

    if args.init {
        let cmprdir = conf_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".cmpr"));
        init::run(&conf_path, &cmprdir)?;
        return Ok(());
    }

    let mut config = if conf_path.exists() {
        cmpr_config::load_from(&conf_path)?
    } else {
        Config::default()
    };
    let mut prompter = StdinPrompter;
    cmpr_config::ensure_required(&mut config, &conf_path, &mut prompter)?;

    if args.print_conf {
        batch::print_conf(&config);
        return Ok(());
    }

    let project = loader::load_project(&config)?;

    if let Some(n) = args.print_block {
        return batch::print_block(&project, n);
    }
    if let Some(n) = args.print_code {
        return batch::print_code(&project, n);
    }
    if let Some(n) = args.print_comment {
        return batch::print_comment(&project, n);
    }
    if let Some(needle) = args.find_block.as_deref() {
        return batch::find_block(&project, needle);
    }
    if args.count_blocks {
        batch::count_blocks(&project);
        return Ok(());
    }

    let cmprdir = PathBuf::from(&config.cmprdir);
    let mut startup = AppStartup::new();
    startup.configure_logging(&cmprdir)?;
    AppStartup::install_panic_hook();
    tracing::info!(target: "runtime", "startup");

    app::run_interactive(config, project, conf_path, cmprdir)
}
