// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::{Level, info};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use quire::api;
use quire::app_state::AppState;
use quire::blog::BlogStore;
use quire::bootstrap;
use quire::config::ValidatedConfig;
use quire::iam::{FileUserStore, TokenAuthMiddlewareFactory, UserDirectory};
use quire::runtime_paths::RuntimePaths;
use quire::util;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    if matches!(parsed_args.mode, RunMode::Help) {
        print_help();
        return 0;
    }

    let bootstrap = match bootstrap::bootstrap_runtime(&parsed_args.runtime_root) {
        Ok(result) => result,
        Err(error) => {
            eprintln!("❌ Bootstrap error: {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };

    match parsed_args.mode {
        RunMode::UserAdd { name, email } => add_user(&bootstrap.runtime_paths, &name, &email),
        RunMode::Serve => {
            let result = System::new().block_on(run_server(bootstrap));
            match result {
                Ok(()) => 0,
                Err(error) => {
                    eprintln!("❌ Server failed to start: {}", error);
                    1
                }
            }
        }
        RunMode::Help => 0,
    }
}

fn open_user_directory(runtime_paths: &RuntimePaths) -> Result<UserDirectory, String> {
    let store = FileUserStore::new(runtime_paths.users_file.clone()).map_err(|e| e.to_string())?;
    UserDirectory::new(Arc::new(store)).map_err(|e| e.to_string())
}

fn add_user(runtime_paths: &RuntimePaths, name: &str, email: &str) -> i32 {
    let directory = match open_user_directory(runtime_paths) {
        Ok(directory) => directory,
        Err(error) => {
            eprintln!("❌ Failed to load users: {}", error);
            return 1;
        }
    };
    match directory.add_user(name, email) {
        Ok((user, token)) => {
            println!("Created user {} <{}> with id {}", user.name, user.email, user.id);
            println!("API token (shown once): {}", token);
            0
        }
        Err(error) => {
            eprintln!("❌ Failed to add user: {}", error);
            1
        }
    }
}

async fn run_server(bootstrap: bootstrap::BootstrapResult) -> std::io::Result<()> {
    let validated_config = Arc::new(bootstrap.validated_config);
    let runtime_paths = bootstrap.runtime_paths;

    // Configure logging with a stable format
    let logger = env_logger::Builder::from_default_env()
        .filter_level(validated_config.log_level)
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .build();

    util::init_logger(
        vec![("actix_server".to_string(), Level::Info, Level::Debug)],
        logger,
    )
    .map_err(|error| {
        eprintln!("❌ Failed to initialize logger: {}", error);
        std::io::Error::other(error.to_string())
    })?;

    log_startup_info(&validated_config, &runtime_paths);

    let users = match open_user_directory(&runtime_paths) {
        Ok(directory) => Arc::new(directory),
        Err(error) => {
            eprintln!("❌ Failed to load users: {}", error);
            eprintln!("❌ Application cannot start without the users file.");
            return Err(std::io::Error::other(error));
        }
    };
    if users.list().is_empty() {
        log::warn!("No API users configured; write endpoints that need a user will answer 401");
    }

    let store = match BlogStore::open(runtime_paths.data_file.clone()) {
        Ok(store) => store,
        Err(error) => {
            eprintln!("❌ Failed to load blog data: {}", error);
            return Err(std::io::Error::other(error.to_string()));
        }
    };
    let app_state = Arc::new(AppState::new(store));

    let workers = validated_config.server.workers;
    let (host, port) = validated_config.server.address_tuple();
    let address = (host.to_string(), port);

    let config_for_factory = validated_config.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(config_for_factory.clone()))
            .app_data(web::Data::from(app_state.clone()))
            .app_data(web::Data::from(users.clone()))
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#,
            ))
            .wrap(TokenAuthMiddlewareFactory)
            .configure(api::configure)
    })
    .workers(workers)
    .bind(address)?
    .run()
    .await
}

fn log_startup_info(config: &ValidatedConfig, runtime_paths: &RuntimePaths) {
    info!("Starting {}", config.app.name);
    info!("Workers: {}", config.server.workers);
    info!(
        "API listening on http://{}:{}/api",
        config.server.host, config.server.port
    );
    info!("Config file: {}", runtime_paths.config_file.display());
    info!("Users file: {}", runtime_paths.users_file.display());
    info!("Blog data file: {}", runtime_paths.data_file.display());
    info!("Runtime root: {}", runtime_paths.root.display());
}

fn print_help() {
    println!("Usage: quire [-C <root>] [user-add <name> <email>]");
    println!();
    println!("  -C <root>                 runtime directory (default: current directory)");
    println!("  user-add <name> <email>   register an API user and print its token");
    println!("  -h, --help                show this help");
}

#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    Serve,
    UserAdd { name: String, email: String },
    Help,
}

#[derive(Debug)]
struct ParsedArgs {
    runtime_root: PathBuf,
    mode: RunMode,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(ParsedArgs {
            runtime_root: PathBuf::from("."),
            mode: RunMode::Help,
        });
    }

    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");
    let mut cli_tokens = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--" {
            continue;
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = PathBuf::from(value);
        } else {
            cli_tokens.push(arg);
        }
    }

    let runtime_root = make_runtime_root_absolute(runtime_root)?;

    let mode = match cli_tokens.as_slice() {
        [] => RunMode::Serve,
        [command] if command.eq_ignore_ascii_case("help") => RunMode::Help,
        [command, name, email] if command == "user-add" => RunMode::UserAdd {
            name: name.clone(),
            email: email.clone(),
        },
        [command, ..] if command == "user-add" => {
            return Err("usage: user-add <name> <email>".to_string());
        }
        [command, ..] => return Err(format!("Unknown command: {}", command)),
    };

    Ok(ParsedArgs { runtime_root, mode })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}

#[cfg(test)]
mod tests {
    use super::{RunMode, parse_args_from};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_args_defaults_to_serve() {
        let parsed = parse_args_from(Vec::new()).expect("parse args");
        assert_eq!(parsed.mode, RunMode::Serve);
        assert!(parsed.runtime_root.is_absolute());
    }

    #[test]
    fn parse_args_accepts_runtime_root() {
        let parsed = parse_args_from(args(&["-C", "/srv/blog"])).expect("parse args");
        assert_eq!(parsed.runtime_root, std::path::PathBuf::from("/srv/blog"));
    }

    #[test]
    fn parse_args_reads_user_add() {
        let parsed = parse_args_from(args(&["-C", "/srv/blog", "user-add", "Ada", "ada@example.com"]))
            .expect("parse args");
        assert_eq!(
            parsed.mode,
            RunMode::UserAdd {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string()
            }
        );
    }

    #[test]
    fn parse_args_rejects_incomplete_user_add() {
        assert!(parse_args_from(args(&["user-add", "Ada"])).is_err());
        assert!(parse_args_from(args(&["frobnicate"])).is_err());
    }

    #[test]
    fn parse_args_accepts_help() {
        let parsed = parse_args_from(args(&["--help", "user-add"])).expect("parse args");
        assert_eq!(parsed.mode, RunMode::Help);
        let parsed = parse_args_from(args(&["help"])).expect("parse args");
        assert_eq!(parsed.mode, RunMode::Help);
    }

    #[test]
    fn parse_args_requires_root_value() {
        assert!(parse_args_from(args(&["-C"])).is_err());
    }
}
