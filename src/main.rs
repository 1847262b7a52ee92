use clap::{Args, Parser, Subcommand};
use menu_sync::client::{ClientError, MenuClient};
use menu_sync::config::{self, SiteConfig};
use menu_sync::editor::MenuEditor;
use menu_sync::i18n::{Language, LanguagePreference};
use menu_sync::server::{self, AppState};
use menu_sync::store::{DiskBackend, MenuStore, PublishReceipt, StoreError, StorePaths};
use menu_sync::types::{ItemPatch, MenuItem, MenuTree};
use menu_sync::validate::{self, Rules};
use menu_sync::{harness, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "menu-sync")]
#[command(about = "Edit and publish a bilingual site navigation menu")]
#[command(long_about = "\
Edit and publish a bilingual site navigation menu

The menu lives in one JSON file keyed by language code. Every publish
validates the whole tree, keeps the previous file as a backup, replaces
the file atomically, and regenerates an HTML fragment of the menu.

Site layout (defaults, see 'menu-sync gen-config'):

  site/
  ├── menu-sync.toml          # Optional config
  ├── data/
  │   ├── menu.json           # Canonical menu
  │   └── menu.json.bak       # Previous generation
  ├── menu.html               # Rendered mirror
  └── .menu-sync/language     # Operator's UI language

Edits apply to the local files unless --server points at a running
'menu-sync serve', in which case they go through its publish endpoint.")]
#[command(version)]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: <root>/menu-sync.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Where edits are published.
#[derive(Args, Clone)]
struct Target {
    /// Publish through a running endpoint instead of the local files
    #[arg(long, value_name = "URL")]
    server: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the publish endpoint
    Serve {
        /// Override server.host
        #[arg(long)]
        host: Option<String>,
        /// Override server.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the menu in the preferred language
    Show {
        /// Language code (default: stored preference)
        #[arg(long)]
        lang: Option<String>,
        /// Print every language
        #[arg(long, conflicts_with = "lang")]
        all: bool,
        #[command(flatten)]
        target: Target,
    },
    /// Add an item and publish
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        label: String,
        #[arg(long)]
        url: String,
        /// Nest under this item (same language)
        #[arg(long)]
        parent: Option<String>,
        /// Language code (default: stored preference)
        #[arg(long)]
        lang: Option<String>,
        #[command(flatten)]
        target: Target,
    },
    /// Change an item's label or url and publish
    Update {
        id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[command(flatten)]
        target: Target,
    },
    /// Remove an item with its children and publish
    Remove {
        id: String,
        #[command(flatten)]
        target: Target,
    },
    /// Replace the menu with its backup
    Restore,
    /// Regenerate the HTML mirror from the menu file
    Render,
    /// Validate the menu file without changing anything
    Check,
    /// Create required directories and report missing files
    Setup {
        /// Also wait for the endpoint to accept connections
        #[arg(long)]
        wait: bool,
    },
    /// Delete the backup and stray temp files
    Teardown,
    /// Show, set, or toggle the operator's UI language
    Language {
        #[arg(long, conflicts_with = "toggle")]
        set: Option<Language>,
        #[arg(long)]
        toggle: bool,
    },
    /// Print a stock menu-sync.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.root, cli.config.as_deref())?;
    let paths = StorePaths::from_config(&cli.root, &config.paths);
    let store = MenuStore::new(paths.clone(), DiskBackend)
        .with_default_language(config.languages.default);
    let preference = LanguagePreference::new(cli.root.join(&config.paths.preference));

    match cli.command {
        Command::Serve { host, port } => {
            let mut server_config = config.server.clone();
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }
            let addr = server_config.addr()?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                let listener = tokio::net::TcpListener::bind(addr).await?;
                server::run(listener, AppState::new(store)).await
            })?;
        }
        Command::Show { lang, all, target } => {
            let tree = fetch(&store, &target)?;
            if all {
                output::print_tree(&tree, None);
            } else {
                let lang = lang.unwrap_or_else(|| {
                    preference.load(config.languages.default).code().to_string()
                });
                let mut editor = MenuEditor::from_tree(tree, config.languages.default.code())?;
                editor.switch_language(lang);
                output::print_tree(editor.tree(), Some(editor.current_language()));
            }
        }
        Command::Add {
            id,
            label,
            url,
            parent,
            lang,
            target,
        } => {
            let lang = lang
                .unwrap_or_else(|| preference.load(config.languages.default).code().to_string());
            let mut editor = MenuEditor::from_tree(fetch(&store, &target)?, &lang)?;
            editor.add_item(&lang, MenuItem::new(id, label, url), parent.as_deref())?;
            publish(&store, &target, editor.into_tree())?;
        }
        Command::Update {
            id,
            label,
            url,
            target,
        } => {
            let patch = ItemPatch { label, url };
            if patch.is_empty() {
                return Err("nothing to update: pass --label and/or --url".into());
            }
            let mut editor = MenuEditor::from_tree(
                fetch(&store, &target)?,
                config.languages.default.code(),
            )?;
            editor.update_item(&id, &patch)?;
            publish(&store, &target, editor.into_tree())?;
        }
        Command::Remove { id, target } => {
            let mut editor = MenuEditor::from_tree(
                fetch(&store, &target)?,
                config.languages.default.code(),
            )?;
            let removed = editor.remove_item(&id)?;
            println!("Removed {} ({})", removed.label, removed.id);
            publish(&store, &target, editor.into_tree())?;
        }
        Command::Restore => {
            let receipt = store.restore_backup()?;
            output::print_receipt("Restored", &receipt);
        }
        Command::Render => match store.render_mirror()? {
            Some(path) => println!("Rendered {}", path.display()),
            None => println!("Mirror disabled (paths.mirror is empty)"),
        },
        Command::Check => {
            println!("==> Checking {}", paths.canonical.display());
            let tree = store.read()?;
            output::print_tree(&tree, None);
            let violations = validate::validate(&tree, Rules::Publish);
            if !violations.is_empty() {
                output::print_violations(&violations);
                std::process::exit(1);
            }
            println!("==> Menu is valid");
        }
        Command::Setup { wait } => {
            let report = harness::setup(&cli.root, &config.harness);
            output::print_setup_report(&report, &cli.root);
            if wait {
                wait_for_endpoint(&config)?;
            }
        }
        Command::Teardown => {
            let report = harness::teardown(&paths);
            output::print_teardown_report(&report, &cli.root);
        }
        Command::Language { set, toggle } => {
            let language = if toggle {
                preference.toggle(config.languages.default)?
            } else if let Some(language) = set {
                preference.save(language)?;
                language
            } else {
                preference.load(config.languages.default)
            };
            println!("{} ({})", language, language.direction().as_str());
        }
        // Printed above, before any config is loaded.
        Command::GenConfig => {}
    }

    Ok(())
}

/// Current tree from the local file or the endpoint.
fn fetch(store: &MenuStore, target: &Target) -> Result<MenuTree, Box<dyn std::error::Error>> {
    match &target.server {
        None => Ok(store.read()?),
        Some(url) => {
            let client = MenuClient::new(url.as_str())?;
            Ok(tokio::runtime::Runtime::new()?.block_on(client.fetch())?)
        }
    }
}

/// Publish `tree` and print the receipt, or the violations and exit 1.
fn publish(
    store: &MenuStore,
    target: &Target,
    tree: MenuTree,
) -> Result<(), Box<dyn std::error::Error>> {
    let result: Result<PublishReceipt, Box<dyn std::error::Error>> = match &target.server {
        None => match store.publish(tree) {
            Err(StoreError::Validation(violations)) => {
                output::print_violations(&violations);
                std::process::exit(1);
            }
            other => other.map_err(Into::into),
        },
        Some(url) => {
            let client = MenuClient::new(url.as_str())?;
            match tokio::runtime::Runtime::new()?.block_on(client.publish(&tree)) {
                Err(ClientError::Rejected(violations)) => {
                    output::print_violations(&violations);
                    std::process::exit(1);
                }
                other => other.map_err(Into::into),
            }
        }
    };
    output::print_receipt("Published", &result?);
    Ok(())
}

fn wait_for_endpoint(config: &SiteConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.server.addr()?;
    let runtime = tokio::runtime::Runtime::new()?;
    let ready = runtime.block_on(harness::wait_ready(
        addr,
        config.harness.ready_timeout(),
        config.harness.ready_poll(),
    ));
    if ready {
        println!("Endpoint ready at {}", addr);
    } else {
        println!("Endpoint at {} not ready after {:?}", addr, config.harness.ready_timeout());
    }
    Ok(())
}
