use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "inkpost")]
#[command(version)]
#[command(about = "Blogging backend with cookie sessions and hosted images", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Start the HTTP server (default)")]
    Serve(ServeArgs),

    #[command(name = "init-config")]
    #[command(about = "Write a default config file with empty secrets")]
    InitConfig {
        #[arg(short, long, default_value = "inkpost.toml")]
        path: PathBuf,

        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(short, long, default_value = "inkpost.toml")]
    pub config: PathBuf,

    #[arg(long, help = "Override server.host")]
    pub host: Option<String>,

    #[arg(short, long, help = "Override server.port")]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Load config from the file and environment, then apply flag overrides
    pub fn load_config(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = Config::load(&self.config)?;
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        config.validate()?;
        Ok(config)
    }
}

/// What `main` should do after parsing arguments
pub enum Action {
    Serve(ServeArgs),
    Done,
}

pub fn run() -> Result<Action, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        None => Ok(Action::Serve(cli.serve)),
        Some(Commands::Serve(args)) => Ok(Action::Serve(args)),
        Some(Commands::InitConfig { path, force }) => {
            init_config(&path, force)?;
            Ok(Action::Done)
        }
    }
}

fn init_config(path: &PathBuf, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!("'{}' already exists (use --force to overwrite)", path.display()).into());
    }

    Config::default().save(path)?;
    println!("✓ Wrote default config to {}", path.display());
    println!("  Set JWT_SECRET and the CLOUDINARY_* variables before serving.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["inkpost"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.serve.config, PathBuf::from("inkpost.toml"));
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from(["inkpost", "serve", "--port", "9000", "--host", "0.0.0.0"]).unwrap();
        match cli.command {
            Some(Commands::Serve(args)) => {
                assert_eq!(args.port, Some(9000));
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let path = std::env::temp_dir().join(format!("inkpost_init_{}.toml", uuid::Uuid::new_v4()));
        init_config(&path, false).unwrap();
        assert!(init_config(&path, false).is_err());
        assert!(init_config(&path, true).is_ok());

        let saved: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(saved.auth.token_secret.is_empty());

        std::fs::remove_file(&path).ok();
    }
}
