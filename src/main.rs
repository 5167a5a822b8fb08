use anyhow::Result;
use clap::Parser;
use packsplit::cli::{AppContext, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    packsplit::infra::logging::init(ctx.quiet);

    match cli.command {
        Commands::Build(args) => packsplit::build_run(args, &ctx),
        Commands::Strip(args) => packsplit::strip_file_run(args, &ctx),
        Commands::Init(args) => packsplit::infra::config::init(args, &ctx),
        Commands::Completions(args) => packsplit::completion::run(args, &ctx),
    }
}
