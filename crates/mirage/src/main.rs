use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mirage::config::MirageConfig;
use mirage::game::GameServerBuilder;
use mirage::login::LoginServerBuilder;
use mirage::MirageError;
use mirage_store::SqliteStore;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "mirage.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand, Debug)]
enum Role {
    /// Run the login server
    Login {
        /// Override `login.bind`
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run a game server
    Game {
        /// Override `game.bind`
        #[arg(long)]
        bind: Option<String>,
        /// Override `game.world_id`
        #[arg(long)]
        world: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), MirageError> {
    let cli = Cli::parse();
    mirage::init_tracing();

    let config = MirageConfig::load(&cli.config)?;
    let store = Arc::new(SqliteStore::open(&config.database)?);
    config.seed.apply(&store)?;

    match cli.role {
        Role::Login { bind } => {
            let mut login = config.login;
            if let Some(bind) = bind {
                login.bind = bind;
            }
            LoginServerBuilder::new()
                .config(login)
                .secret(config.secret)
                .build(store)
                .await?
                .run()
                .await
        }
        Role::Game { bind, world } => {
            let mut game = config.game;
            if let Some(bind) = bind {
                game.bind = bind;
            }
            if let Some(world) = world {
                game.world_id = world;
            }
            GameServerBuilder::new()
                .config(game)
                .secret(config.secret)
                .build(store)
                .await?
                .run()
                .await
        }
    }
}
