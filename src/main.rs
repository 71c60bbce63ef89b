use anyhow::Result;
use clap::{ArgGroup, Parser};
use isaacsim_links::commands;
use isaacsim_links::runtime::RealRuntime;

/// isaacsim-links - Isaac Sim extension links for IDEs
///
/// Links the Python packages shipped inside Isaac Sim extension directories
/// into the isaacsim, omni and carb packages of the active site-packages, so
/// language servers can resolve them. Every link is recorded and --remove
/// undoes exactly what --create did.
///
/// The site-packages directory is taken from ISAACSIM_LINKS_SITE_PACKAGES when
/// set, otherwise from the Python interpreter ($PYTHON, python3 or python).
#[derive(Parser, Debug)]
#[command(author, version = env!("ISAACSIM_LINKS_VERSION"), about)]
#[command(group(ArgGroup::new("action").required(true).args(["create", "remove"])))]
struct Cli {
    /// Create symlinks for every discovered extension package
    #[arg(long)]
    create: bool,

    /// Remove the symlinks and directories recorded by --create
    #[arg(long)]
    remove: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    if cli.create {
        let count = commands::create(runtime)?;
        println!("Created or updated {} link(s).", count);
    } else if cli.remove {
        let count = commands::remove(runtime)?;
        println!("Removed {} link(s) and director(ies).", count);
    }
    Ok(())
}
