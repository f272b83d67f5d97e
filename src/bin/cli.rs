//! respkv CLI Client
//!
//! Command-line interface for interacting with respkv.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use respkv::protocol::{read_value, write_value};
use respkv::Value;

/// respkv CLI
#[derive(Parser, Debug)]
#[command(name = "respkv-cli")]
#[command(about = "CLI for the respkv key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete keys
    Del {
        /// The keys to delete
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Count how many of the keys exist
    Exists {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Ping the server
    Ping,

    /// Stop the server after it syncs the log
    Shutdown,

    /// Send an arbitrary command, e.g. `raw ECHO hello`
    Raw {
        #[arg(required = true)]
        parts: Vec<String>,
    },
}

impl Commands {
    fn into_parts(self) -> Vec<String> {
        match self {
            Commands::Get { key } => vec!["GET".to_string(), key],
            Commands::Set { key, value } => vec!["SET".to_string(), key, value],
            Commands::Del { keys } => vec!["DEL".to_string()].into_iter().chain(keys).collect(),
            Commands::Exists { keys } => {
                vec!["EXISTS".to_string()].into_iter().chain(keys).collect()
            }
            Commands::Ping => vec!["PING".to_string()],
            Commands::Shutdown => vec!["SHUTDOWN".to_string()],
            Commands::Raw { parts } => parts,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let request = Value::command(args.command.into_parts());

    match roundtrip(&args.server, &request) {
        Ok(reply) => {
            let is_error = matches!(reply, Value::Error(_));
            println!("{}", format_reply(&reply, 0));
            if is_error {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn roundtrip(addr: &str, request: &Value) -> respkv::Result<Value> {
    let stream = TcpStream::connect(addr)?;
    let mut writer = BufWriter::new(stream.try_clone()?);
    let mut reader = BufReader::new(stream);

    write_value(&mut writer, request)?;
    read_value(&mut reader)?.ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "server closed the connection without replying",
        )
        .into()
    })
}

/// Render a reply the way redis-cli does
fn format_reply(value: &Value, indent: usize) -> String {
    match value {
        Value::SimpleString(s) => String::from_utf8_lossy(s).into_owned(),
        Value::Error(s) => format!("(error) {}", String::from_utf8_lossy(s)),
        Value::Integer(n) => format!("(integer) {}", n),
        Value::BulkString(data) => format!("\"{}\"", String::from_utf8_lossy(data)),
        Value::Null => "(nil)".to_string(),
        Value::Array(items) if items.is_empty() => "(empty array)".to_string(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let pad = if i == 0 { String::new() } else { " ".repeat(indent) };
                format!("{}{}) {}", pad, i + 1, format_reply(item, indent + 3))
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
