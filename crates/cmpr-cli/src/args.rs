//! CLI surface (§6): one optional `--conf` override plus a set of mutually
//! exclusive action flags. `--help`/`--version` are handled by `clap`
//! itself before any of this runs.

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cmpr",
    version,
    about = "Tile project source into navigable comment/code blocks"
)]
#[command(group(
    ArgGroup::new("action")
        .args([
            "init",
            "print_conf",
            "print_block",
            "print_code",
            "print_comment",
            "find_block",
            "count_blocks",
        ])
        .multiple(false)
))]
pub struct Args {
    /// Config file path (default: `.cmpr/conf` under the working directory).
    #[arg(long = "conf")]
    pub conf: Option<PathBuf>,

    /// Scaffold `.cmpr/` and prompt for any missing required config values.
    #[arg(long)]
    pub init: bool,

    /// Print the resolved configuration and exit.
    #[arg(long = "print-conf")]
    pub print_conf: bool,

    /// Print block N (1-based) in full and exit.
    #[arg(long = "print-block", value_name = "N")]
    pub print_block: Option<usize>,

    /// Print only the code part of block N (1-based) and exit.
    #[arg(long = "print-code", value_name = "N")]
    pub print_code: Option<usize>,

    /// Print only the comment part of block N (1-based) and exit.
    #[arg(long = "print-comment", value_name = "N")]
    pub print_comment: Option<usize>,

    /// Print the 1-based index of the first block containing STRING and exit.
    #[arg(long = "find-block", value_name = "STRING")]
    pub find_block: Option<String>,

    /// Print the total block count and exit.
    #[arg(long = "count-blocks")]
    pub count_blocks: bool,
}
