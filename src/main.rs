use clap::Parser;
use env_logger::Env;
use keepintouch::cli::{
    run_activity, run_add, run_calendar, run_config, run_delete, run_edit, run_import, run_list,
    run_remind, run_search, run_show, Cli, Commands,
};
use keepintouch::db::Database;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let db = Database::open()?;

    match cli.command {
        Commands::Add(args) => run_add(&db, args)?,
        Commands::Edit(args) => run_edit(&db, args)?,
        Commands::List(args) => run_list(&db, args.page, args.limit)?,
        Commands::Search(args) => run_search(&db, &args.query, args.limit)?,
        Commands::Show(args) => run_show(&db, &args.identifier)?,
        Commands::Delete(args) => run_delete(&db, &args.identifier, args.yes)?,
        Commands::Import(args) => run_import(&db, args)?,
        Commands::Remind { command } => run_remind(&db, command)?,
        Commands::Activity { command } => run_activity(&db, command)?,
        Commands::Config { command } => run_config(&db, command)?,
        Commands::Calendar { command } => run_calendar(&db, command)?,
    }

    Ok(())
}
