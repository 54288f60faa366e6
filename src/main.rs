use clap::Parser;
use foodgram::cli::{self, Cli, Command};
use foodgram::config::AppConfig;
use foodgram::{build_app, db, with_trailing_slash_tolerance};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.log_filter);
    if config.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    init_tracing(&config);

    let pool = db::init_pool(&config.database_url).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let addr = config.bind_addr()?;
            let app = with_trailing_slash_tolerance(build_app(pool, config));

            let listener = TcpListener::bind(addr).await?;
            tracing::info!("listening on {}", addr);
            axum::serve(
                listener,
                axum::ServiceExt::<axum::extract::Request>::into_make_service(app),
            )
            .await?;
        }
        Command::CreateTag { name, slug, color } => {
            cli::create_tag(&pool, &name, color.as_deref(), &slug).await?;
        }
        Command::ImportIngredients { path } => {
            cli::import_ingredients(&pool, &path).await?;
        }
    }

    Ok(())
}
