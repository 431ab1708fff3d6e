use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["vitrine-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["vitrine-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_db_seed_command() {
    let cli = Cli::try_parse_from(["vitrine-cli", "db", "seed"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Seed
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["vitrine-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn stats_limit_defaults_to_ranking_default() {
    let cli = Cli::try_parse_from(["vitrine-cli", "stats"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Stats { limit: 10 })
    ));
}

#[test]
fn stats_accepts_explicit_limit() {
    let cli = Cli::try_parse_from(["vitrine-cli", "stats", "--limit", "3"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Stats { limit: 3 })));
}

#[test]
fn db_requires_a_subcommand() {
    assert!(Cli::try_parse_from(["vitrine-cli", "db"]).is_err());
}
