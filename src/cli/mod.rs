use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use flavorkit::ReleaseError;

mod check;
mod release;
mod schema;
mod show;
mod update_yaml;

#[derive(Parser)]
#[command(
    name = "flavorkit",
    version,
    about = "Release tooling for flavored packages and bundles"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding releaser.yaml and the package manifests
    #[arg(long, short = 'd', global = true, default_value = ".")]
    dir: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Show project information
    #[arg(long)]
    about: bool,
}

#[derive(Args)]
struct ShowArgs {
    /// Flavor name from releaser.yaml
    flavor: String,
    /// Print only the version, without the flavor suffix
    #[arg(long)]
    version_only: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// Flavor name from releaser.yaml
    flavor: String,
    /// Print true if a release is necessary, false otherwise (always exit 0)
    #[arg(long, short = 'b')]
    boolean: bool,
}

#[derive(Args)]
struct UpdateYamlArgs {
    /// Flavor name from releaser.yaml
    flavor: String,
    /// Rewrite the manifests even if the version is already tagged
    #[arg(long)]
    skip_tag_check: bool,
}

#[derive(Args)]
struct PlatformArgs {
    /// Flavor name from releaser.yaml
    flavor: String,
    /// Environment variable holding the API token [default: per platform]
    #[arg(long, short = 't')]
    token_var_name: Option<String>,
}

#[derive(Args)]
struct SchemaArgs {
    /// Directory searched recursively for values.yaml files
    #[arg(long, short = 'b', default_value = "./charts")]
    base_dir: PathBuf,
    /// Directory of extra *.json schema fragments, keyed by file name
    #[arg(long)]
    schemas_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
#[command(next_display_order = None)]
enum Commands {
    /// Print the release tag for a flavor
    Show(ShowArgs),
    /// Check whether a flavor's version is already tagged
    Check(CheckArgs),
    /// Set the flavor's version in zarf.yaml and the bundle manifest
    #[command(alias = "u")]
    UpdateYaml(UpdateYamlArgs),
    /// Create tags and releases
    #[command(subcommand)]
    Release(ReleaseCommands),
    /// Generate or validate values.schema.json files
    #[command(subcommand)]
    Schema(SchemaCommands),
}

#[derive(Subcommand)]
enum ReleaseCommands {
    /// Create a tag and release on GitHub
    Github(PlatformArgs),
    /// Create a tag and release on GitLab
    Gitlab(PlatformArgs),
    /// Check whether a flavor's version is already tagged
    Check(CheckArgs),
    /// Print the release tag for a flavor
    Show(ShowArgs),
    /// Set the flavor's version in zarf.yaml and the bundle manifest
    #[command(alias = "u")]
    UpdateYaml(UpdateYamlArgs),
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Write values.schema.json beside every values.yaml
    #[command(alias = "g")]
    Generate(SchemaArgs),
    /// Compare committed schemas with freshly generated ones
    #[command(alias = "v")]
    Validate {
        #[command(flatten)]
        args: SchemaArgs,
        /// Print a line diff of the schema files instead of a path report
        #[arg(long)]
        unified: bool,
    },
}

pub fn run(cli: Cli) {
    if cli.about {
        print_about();
        return;
    }

    let dir = cli.dir;
    match cli.command {
        Some(Commands::Show(args) | Commands::Release(ReleaseCommands::Show(args))) => {
            show::run(&dir, &args.flavor, args.version_only)
        }
        Some(Commands::Check(args) | Commands::Release(ReleaseCommands::Check(args))) => {
            check::run(&dir, &args.flavor, args.boolean)
        }
        Some(
            Commands::UpdateYaml(args) | Commands::Release(ReleaseCommands::UpdateYaml(args)),
        ) => update_yaml::run(&dir, &args.flavor, args.skip_tag_check),
        Some(Commands::Release(ReleaseCommands::Github(args))) => {
            release::run_github(&dir, &args.flavor, args.token_var_name)
        }
        Some(Commands::Release(ReleaseCommands::Gitlab(args))) => {
            release::run_gitlab(&dir, &args.flavor, args.token_var_name)
        }
        Some(Commands::Schema(SchemaCommands::Generate(args))) => {
            schema::run_generate(&args.base_dir, args.schemas_dir.as_deref())
        }
        Some(Commands::Schema(SchemaCommands::Validate { args, unified })) => {
            schema::run_validate(&args.base_dir, args.schemas_dir.as_deref(), unified)
        }
        None => {
            eprintln!("Usage: flavorkit <command> [args]");
            eprintln!("Run `flavorkit --help` for details.");
            std::process::exit(1);
        }
    }
}

/// Report a failed command and exit: 2 when there is nothing to release,
/// 1 for everything else.
fn fail(command: &str, err: &ReleaseError) -> ! {
    eprintln!("flavorkit {command}: {err}");
    let code = if err.is_no_release_necessary() { 2 } else { 1 };
    std::process::exit(code);
}

fn print_about() {
    println!(
        "flavorkit: release tooling for flavored packages\n\
         ├─ version:    {}\n\
         ├─ author:     {}\n\
         ├─ source:     {}\n\
         └─ licence:    {} https://www.apache.org/licenses/LICENSE-2.0",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_AUTHORS"),
        env!("CARGO_PKG_REPOSITORY"),
        env!("CARGO_PKG_LICENSE"),
    );
}
