use super::*;

#[test]
fn parses_db_ping_command() {
    let cli =
        Cli::try_parse_from(["storefront-cli", "db", "ping"]).expect("expected valid cli args");

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
        Cli::try_parse_from(["storefront-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_db_seed_command() {
    let cli =
        Cli::try_parse_from(["storefront-cli", "db", "seed"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Seed
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["storefront-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_users_create_admin() {
    let cli = Cli::try_parse_from([
        "storefront-cli",
        "users",
        "create-admin",
        "--name",
        "Store Owner",
        "--email",
        "owner@example.com",
        "--password",
        "hunter22",
    ])
    .unwrap();

    if let Some(Commands::Users {
        command:
            UsersCommands::CreateAdmin {
                ref name,
                ref email,
                ref password,
            },
    }) = cli.command
    {
        assert_eq!(name, "Store Owner");
        assert_eq!(email, "owner@example.com");
        assert_eq!(password, "hunter22");
    } else {
        panic!("unexpected command variant");
    }
}

#[test]
fn create_admin_requires_email() {
    let result = Cli::try_parse_from([
        "storefront-cli",
        "users",
        "create-admin",
        "--name",
        "Store Owner",
        "--password",
        "hunter22",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_users_make_admin() {
    let cli = Cli::try_parse_from([
        "storefront-cli",
        "users",
        "make-admin",
        "--email",
        "staff@example.com",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Users {
            command: UsersCommands::MakeAdmin { ref email }
        }) if email == "staff@example.com"
    ));
}

#[test]
fn parses_products_import_defaults() {
    let cli =
        Cli::try_parse_from(["storefront-cli", "products", "import", "catalog.csv"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Products {
            command: ProductsCommands::Import {
                ref file,
                dry_run: false
            }
        }) if file == &PathBuf::from("catalog.csv")
    ));
}

#[test]
fn parses_products_import_dry_run() {
    let cli = Cli::try_parse_from([
        "storefront-cli",
        "products",
        "import",
        "catalog.json",
        "--dry-run",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Products {
            command: ProductsCommands::Import { dry_run: true, .. }
        })
    ));
}

#[test]
fn products_import_requires_a_file() {
    assert!(Cli::try_parse_from(["storefront-cli", "products", "import"]).is_err());
}
