//! `--init`: first-run scaffolding (SPEC_FULL.md §3), supplementing the
//! bare "prompt for missing keys" behavior with the directory layout
//! the rest of the tool assumes already exists (§6 on-disk layout).

use crate::prompt::StdinPrompter;
use anyhow::Result;
use cmpr_config::Config;
use std::path::Path;

pub fn run(conf_path: &Path, cmprdir: &Path) -> Result<Config> {
    for sub in ["revs", "tmp", "api_calls"] {
        std::fs::create_dir_all(cmprdir.join(sub))?;
    }

    let mut config = if conf_path.exists() {
        cmpr_config::load_from(conf_path)?
    } else {
        Config::default()
    };
    let mut prompter = StdinPrompter;
    cmpr_config::ensure_required(&mut config, conf_path, &mut prompter)?;
    println!("initialized {}", cmprdir.display());
    Ok(config)
}
