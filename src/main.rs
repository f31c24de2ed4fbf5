use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use reqkit::{Client, ClientConfig, RequestError, RequestOptions};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// reqkit - JSON over HTTP from the command line
///
/// Sends a request relative to the configured root URL, appends the auth
/// token as a query parameter and prints the JSON response.
///
/// Examples:
///   reqkit --root-url http://localhost:5000 get /users -p id=5
///   reqkit post /users --data '{"name": "ann"}' --schema user.schema.json
#[derive(Parser, Debug)]
#[command(author, version = env!("REQKIT_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file (also via REQKIT_CONFIG)
    #[arg(
        long,
        short = 'c',
        env = "REQKIT_CONFIG",
        value_name = "PATH",
        global = true
    )]
    config: Option<PathBuf>,

    /// Root URL requests are sent to (overrides the config file)
    #[arg(long = "root-url", env = "REQKIT_ROOT_URL", value_name = "URL", global = true)]
    root_url: Option<String>,

    /// Auth token appended to every request (overrides the config file)
    #[arg(
        long,
        env = "REQKIT_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    token: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long = "timeout-ms", value_name = "MS", global = true)]
    timeout_ms: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Send a GET request
    Get(PathArgs),

    /// Send a DELETE request
    Delete(PathArgs),

    /// Send a POST request with a JSON body
    Post(BodyArgs),

    /// Send a PUT request with a JSON body
    Put(BodyArgs),

    /// POST a JSON body to an absolute URL, without token or params
    PostUrl(UrlArgs),
}

#[derive(clap::Args, Debug)]
struct RequestArgs {
    /// Query parameter, may be repeated
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// JSON Schema file the response must match
    #[arg(long, value_name = "FILE")]
    schema: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct PathArgs {
    /// Path relative to the root URL
    path: String,

    #[command(flatten)]
    request: RequestArgs,
}

#[derive(clap::Args, Debug)]
struct BodyArgs {
    /// Path relative to the root URL
    path: String,

    /// JSON request body
    #[arg(long, short = 'd', value_name = "JSON", default_value = "null")]
    data: String,

    #[command(flatten)]
    request: RequestArgs,
}

#[derive(clap::Args, Debug)]
struct UrlArgs {
    /// Absolute URL
    url: String,

    /// JSON request body
    #[arg(long, short = 'd', value_name = "JSON", default_value = "null")]
    data: String,

    /// JSON Schema file the response must match
    #[arg(long, value_name = "FILE")]
    schema: Option<PathBuf>,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

impl Cli {
    /// Config file (or defaults) with command line overrides applied.
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        if let Some(root_url) = &self.root_url {
            config.root_url = root_url.clone();
        }
        if let Some(token) = &self.token {
            config.token = token.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        Ok(config)
    }
}

fn read_schema(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse schema file {:?}", path))
}

fn parse_body(data: &str) -> Result<Value> {
    serde_json::from_str(data).context("Request body given with --data is not valid JSON")
}

fn request_options(params: &[(String, String)], schema: Option<&Path>) -> Result<RequestOptions> {
    let mut options = RequestOptions::new().params(params.iter().cloned());
    if let Some(path) = schema {
        options = options.schema(read_schema(path)?);
    }
    Ok(options)
}

async fn execute(client: &Client, command: Commands) -> Result<Value> {
    let value = match command {
        Commands::Get(args) => {
            let options = request_options(&args.request.params, args.request.schema.as_deref())?;
            client.get(&args.path, options).await?
        }
        Commands::Delete(args) => {
            let options = request_options(&args.request.params, args.request.schema.as_deref())?;
            client.delete(&args.path, options).await?
        }
        Commands::Post(args) => {
            let body = parse_body(&args.data)?;
            let options = request_options(&args.request.params, args.request.schema.as_deref())?;
            client.post(&args.path, &body, options).await?
        }
        Commands::Put(args) => {
            let body = parse_body(&args.data)?;
            let options = request_options(&args.request.params, args.request.schema.as_deref())?;
            client.put(&args.path, &body, options).await?
        }
        Commands::PostUrl(args) => {
            let body = parse_body(&args.data)?;
            let options = request_options(&[], args.schema.as_deref())?;
            client.post_to_url(&args.url, &body, options).await?
        }
    };
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = cli.client_config()?;
    debug!("Using {:?}", config);
    let client = reqkit::global::init(config)?;

    match execute(client, cli.command).await {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => match e.downcast_ref::<RequestError>() {
            Some(failure) => {
                eprintln!("{}", serde_json::to_string_pretty(&failure.payload())?);
                std::process::exit(1);
            }
            None => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_cli_get_parsing() {
        let cli = Cli::try_parse_from(["reqkit", "get", "/users", "-p", "id=5", "-p", "q=a=b"])
            .unwrap();
        match cli.command {
            Commands::Get(args) => {
                assert_eq!(args.path, "/users");
                assert_eq!(
                    args.request.params,
                    vec![
                        ("id".to_string(), "5".to_string()),
                        ("q".to_string(), "a=b".to_string())
                    ]
                );
                assert!(args.request.schema.is_none());
            }
            _ => panic!("Expected Get command"),
        }
    }

    #[test]
    fn test_cli_post_parsing() {
        let cli = Cli::try_parse_from([
            "reqkit",
            "post",
            "/users",
            "--data",
            r#"{"name":"ann"}"#,
            "--schema",
            "user.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Post(args) => {
                assert_eq!(args.path, "/users");
                assert_eq!(parse_body(&args.data).unwrap()["name"], "ann");
                assert_eq!(args.request.schema, Some(PathBuf::from("user.json")));
            }
            _ => panic!("Expected Post command"),
        }
    }

    #[test]
    fn test_cli_post_url_default_body() {
        let cli = Cli::try_parse_from(["reqkit", "post-url", "https://hooks.example/x"]).unwrap();
        match cli.command {
            Commands::PostUrl(args) => {
                assert_eq!(args.url, "https://hooks.example/x");
                assert_eq!(parse_body(&args.data).unwrap(), Value::Null);
            }
            _ => panic!("Expected PostUrl command"),
        }
    }

    #[test]
    fn test_cli_global_options_parsing() {
        let cli = Cli::try_parse_from([
            "reqkit",
            "delete",
            "/users/1",
            "--root-url",
            "http://api.test",
            "--token",
            "T",
            "--timeout-ms",
            "250",
        ])
        .unwrap();
        let config = cli.client_config().unwrap();
        assert_eq!(config.root_url, "http://api.test");
        assert_eq!(config.token, "T");
        assert_eq!(config.timeout_ms, 250);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"root_url": "http://from-file", "token": "file-token", "timeout_ms": 100}}"#
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "reqkit",
            "--config",
            file.path().to_str().unwrap(),
            "--token",
            "cli-token",
            "get",
            "/x",
        ])
        .unwrap();
        let config = cli.client_config().unwrap();
        assert_eq!(config.root_url, "http://from-file");
        assert_eq!(config.token, "cli-token");
        assert_eq!(config.timeout_ms, 100);
    }

    #[test]
    fn test_parse_param_rejects_missing_equals() {
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=v").is_err());
        assert_eq!(
            parse_param("k=").unwrap(),
            ("k".to_string(), String::new())
        );
    }

    #[test]
    fn test_cli_invalid_param_fails() {
        let result = Cli::try_parse_from(["reqkit", "get", "/x", "-p", "broken"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(["reqkit", "/users"]);
        assert!(result.is_err());
    }
}
