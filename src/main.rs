//! icurl - API testing client with a local forwarding proxy
//!
//! Subcommands:
//! - `serve`   run the proxy endpoint
//! - `send`    execute a request, record it in history
//! - `curl`    print the equivalent curl command
//! - `import`  turn a curl command into a request
//! - `history` / `saved`  inspect the persisted collections

use std::fs;

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tokio::net::TcpListener;
use tracing_appender::non_blocking::WorkerGuard;

use icurl::constants::{APP_NAME, APP_VERSION, LOG_FILE_NAME};
use icurl::ui::{render_history, render_response, render_saved, ViewMode};
use icurl::{
    server, AppActor, AppState, AuthType, Config, Executor, FileStorage, Forwarder, Header,
    HttpMethod, ProxyClient, RequestDescriptor,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    let _guard = init_logging(&config);

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("serve", m)) => serve(&config, m).await,
        Some(("send", m)) => {
            let request = descriptor_from(m)?;
            run_request(&config, m, request).await
        }
        Some(("curl", m)) => {
            println!("{}", icurl::to_curl(&descriptor_from(m)?));
            Ok(())
        }
        Some(("import", m)) => import(&config, m),
        Some(("history", m)) => history(&config, m),
        Some(("saved", m)) => saved(&config, m).await,
        _ => unreachable!("subcommand is required"),
    }
}

/// Initialize logging to file, or to stderr when configured
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    if config.log_to_stderr || fs::create_dir_all(&config.log_dir).is_err() {
        tracing_subscriber::fmt().with_writer(std::io::stderr).init();
        return None;
    }

    let file_appender = tracing_appender::rolling::never(&config.log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    Some(guard)
}

fn cli() -> Command {
    Command::new(APP_NAME)
        .version(APP_VERSION)
        .about(clap::crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("serve").about("run the proxy endpoint").arg(
                Arg::new("addr")
                    .long("addr")
                    .value_name("ADDR")
                    .help("bind address, overrides ICURL_ADDR"),
            ),
        )
        .subcommand(
            request_args(Command::new("send").about("send a request and record it in history"))
                .arg(
                    Arg::new("proxy")
                        .long("proxy")
                        .value_name("URL")
                        .help("send through a running proxy endpoint instead of in-process"),
                )
                .arg(
                    Arg::new("save")
                        .long("save")
                        .value_name("NAME")
                        .help("also keep the request under this name"),
                )
                .arg(raw_arg()),
        )
        .subcommand(request_args(
            Command::new("curl").about("print the equivalent curl command"),
        ))
        .subcommand(
            Command::new("import")
                .about("import a curl command")
                .arg(Arg::new("COMMAND").required(true).help("the curl command line"))
                .arg(
                    Arg::new("save")
                        .long("save")
                        .value_name("NAME")
                        .help("keep the imported request under this name"),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("list recent requests")
                .arg(
                    Arg::new("show")
                        .long("show")
                        .value_name("ID")
                        .help("show the recorded response of one entry"),
                )
                .arg(
                    Arg::new("clear")
                        .long("clear")
                        .action(ArgAction::SetTrue)
                        .help("delete all history"),
                )
                .arg(raw_arg()),
        )
        .subcommand(
            Command::new("saved")
                .about("list saved requests")
                .arg(
                    Arg::new("delete")
                        .long("delete")
                        .value_name("ID")
                        .help("delete a saved request"),
                )
                .arg(
                    Arg::new("run")
                        .long("run")
                        .value_name("ID")
                        .help("send a saved request"),
                )
                .arg(
                    Arg::new("proxy")
                        .long("proxy")
                        .value_name("URL")
                        .requires("run")
                        .help("send through a running proxy endpoint"),
                )
                .arg(raw_arg()),
        )
}

fn raw_arg() -> Arg {
    Arg::new("raw")
        .long("raw")
        .action(ArgAction::SetTrue)
        .help("print the body unformatted")
}

fn request_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("URL").required(true).help("absolute request URL"))
        .arg(
            Arg::new("method")
                .short('X')
                .long("request")
                .value_name("METHOD")
                .default_value("GET"),
        )
        .arg(
            Arg::new("header")
                .short('H')
                .long("header")
                .value_name("HEADER")
                .action(ArgAction::Append)
                .help("'Key: Value', may be repeated"),
        )
        .arg(Arg::new("data").short('d').long("data").value_name("BODY"))
        .arg(
            Arg::new("basic")
                .long("basic")
                .value_name("USER:PASS")
                .conflicts_with_all(["bearer", "api-key"]),
        )
        .arg(
            Arg::new("bearer")
                .long("bearer")
                .value_name("TOKEN")
                .conflicts_with("api-key"),
        )
        .arg(Arg::new("api-key").long("api-key").value_name("TOKEN"))
}

fn descriptor_from(m: &ArgMatches) -> Result<RequestDescriptor> {
    let method: HttpMethod = m
        .get_one::<String>("method")
        .map(String::as_str)
        .unwrap_or("GET")
        .parse()?;
    let url = m
        .get_one::<String>("URL")
        .ok_or_else(|| anyhow!("URL is required"))?;

    let mut request = RequestDescriptor::new(method, url.clone());

    for raw in m.get_many::<String>("header").into_iter().flatten() {
        let (key, value) = raw
            .split_once(':')
            .ok_or_else(|| anyhow!("Invalid header format: {}", raw))?;
        request.headers.push(Header::new(key.trim(), value.trim()));
    }

    if let Some(body) = m.get_one::<String>("data") {
        request.body = body.clone();
    }

    if let Some(credentials) = m.get_one::<String>("basic") {
        let (username, password) = credentials.split_once(':').unwrap_or((credentials.as_str(), ""));
        request.auth = AuthType::Basic {
            username: username.to_string(),
            password: password.to_string(),
        };
    } else if let Some(token) = m.get_one::<String>("bearer") {
        request.auth = AuthType::Bearer { token: token.clone() };
    } else if let Some(token) = m.get_one::<String>("api-key") {
        request.auth = AuthType::ApiKey { token: token.clone() };
    }

    Ok(request)
}

fn view_mode(m: &ArgMatches) -> ViewMode {
    if m.get_flag("raw") {
        ViewMode::Raw
    } else {
        ViewMode::Formatted
    }
}

fn executor_for(config: &Config, m: &ArgMatches) -> Executor {
    match m.get_one::<String>("proxy") {
        Some(url) => Executor::Proxy(ProxyClient::new(url)),
        None => Executor::Direct(Forwarder::new(config.timeout)),
    }
}

fn print_notices(state: &mut AppState<FileStorage>) {
    for notice in state.drain_notices() {
        eprintln!("{}", notice);
    }
}

async fn serve(config: &Config, m: &ArgMatches) -> Result<()> {
    let addr = m
        .get_one::<String>("addr")
        .cloned()
        .unwrap_or_else(|| config.bind_addr.clone());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Could not bind {}", addr))?;
    println!("listening on http://{}", listener.local_addr()?);
    server::run(listener, Forwarder::new(config.timeout)).await?;
    Ok(())
}

async fn run_request(config: &Config, m: &ArgMatches, request: RequestDescriptor) -> Result<()> {
    let mut actor = AppActor::spawn(executor_for(config, m), FileStorage::new(&config.data_dir));
    actor.state.set_request(request);

    let sent = actor.send().await?;
    if sent {
        if let Some(name) = m.try_get_one::<String>("save").ok().flatten() {
            actor.state.save_request(name);
        }
    }

    let mut state = actor.shutdown().await?;
    if sent {
        if let Some(response) = &state.response {
            println!("{}", render_response(response, view_mode(m)));
        }
    }
    print_notices(&mut state);
    Ok(())
}

fn import(config: &Config, m: &ArgMatches) -> Result<()> {
    let command = m
        .get_one::<String>("COMMAND")
        .ok_or_else(|| anyhow!("curl command is required"))?;

    let mut state = AppState::new(FileStorage::new(&config.data_dir));
    if state.import_curl(command) {
        println!("{}", serde_json::to_string_pretty(&state.request)?);
        if let Some(name) = m.get_one::<String>("save") {
            state.save_request(name);
        }
    }
    print_notices(&mut state);
    Ok(())
}

fn history(config: &Config, m: &ArgMatches) -> Result<()> {
    let mut state = AppState::new(FileStorage::new(&config.data_dir));

    if m.get_flag("clear") {
        state.clear_history();
    } else if let Some(id) = m.get_one::<String>("show") {
        if !state.load_history(id) {
            return Err(anyhow!("No history entry with id {}", id));
        }
        println!("{}", icurl::to_curl(&state.request));
        if let Some(response) = &state.response {
            println!("\n{}", render_response(response, view_mode(m)));
        }
    } else {
        print!("{}", render_history(state.storage.history(), &chrono::Utc::now()));
    }

    print_notices(&mut state);
    Ok(())
}

async fn saved(config: &Config, m: &ArgMatches) -> Result<()> {
    let storage = FileStorage::new(&config.data_dir);

    if let Some(id) = m.get_one::<String>("run") {
        let request = AppState::new(storage)
            .storage
            .find_saved(id)
            .map(|saved| saved.request.clone())
            .ok_or_else(|| anyhow!("No saved request with id {}", id))?;
        return run_request(config, m, request).await;
    }

    let mut state = AppState::new(storage);
    if let Some(id) = m.get_one::<String>("delete") {
        if !state.delete_saved(id) {
            return Err(anyhow!("No saved request with id {}", id));
        }
        eprintln!("Deleted {}", id);
    } else {
        print!("{}", render_saved(state.storage.saved()));
    }

    print_notices(&mut state);
    Ok(())
}
