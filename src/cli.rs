use anyhow::{bail, Result};
use clap::Parser;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    if let Some(tag) = option_env!("TN_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("TN_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("TN_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup; clap wants a 'static str
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser, Debug)]
#[command(name = "tn")]
#[command(about = "Installs and updates language toolchains into ~/.tn")]
#[command(version = get_version())]
#[command(
    after_help = "Examples:\n  tn -i\n  tn -u --tool zig\n  tn -v -u\n  tn -l"
)]
pub struct Cli {
    /// Install the latest release of every enabled toolchain
    #[arg(short, long)]
    pub install: bool,

    /// Replace installed toolchains whose version differs from the latest release
    #[arg(short, long)]
    pub update: bool,

    /// Show what is installed
    #[arg(short, long)]
    pub list: bool,

    /// Only act on this toolchain (repeatable)
    #[arg(long = "tool", value_name = "NAME")]
    pub tools: Vec<String>,

    /// Do not write the setup script or touch the shell profile
    #[arg(long)]
    pub skip_profile: bool,

    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Install,
    Update,
    List,
}

impl Cli {
    /// Exactly one of `-i`, `-u`, `-l` has to be given.
    pub fn mode(&self) -> Result<Mode> {
        let chosen: Vec<Mode> = [
            (self.install, Mode::Install),
            (self.update, Mode::Update),
            (self.list, Mode::List),
        ]
        .into_iter()
        .filter_map(|(set, mode)| set.then_some(mode))
        .collect();

        match chosen.as_slice() {
            [] => bail!("nothing to do"),
            [mode] => Ok(*mode),
            _ => bail!("choose one of --install, --update or --list"),
        }
    }
}
