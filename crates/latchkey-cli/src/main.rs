//! Latchkey rig tool.
//!
//! # Usage
//!
//! ```bash
//! # Play the card, PIN, door story on simulated hardware
//! latchkey simulate
//!
//! # Same, with a rig file and a wrong PIN first
//! latchkey simulate --rig rig.json --wrong-first
//!
//! # Run the keypad against a broker, typing keys on stdin
//! latchkey run keypad --host broker.local --port 1883
//!
//! # Transport encoding of a PIN as the keypad publishes it
//! latchkey encode 1234
//! ```

mod authority;
mod rig;
mod run;
mod simulate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use latchkey_network::MqttConfig;
use latchkey_protocol::{decode_input, encode_input};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::rig::{Rig, RigFile};
use crate::run::DeviceKind;
use crate::simulate::Script;

/// Access-control rig tool
#[derive(Parser, Debug)]
#[command(name = "latchkey")]
#[command(about = "Keypad, door lock and RFID rig simulator")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scripted story and print a JSON report
    Simulate {
        /// Rig file (JSON) overriding identities, PIN, cards, topics and timing
        #[arg(short, long)]
        rig: Option<PathBuf>,

        /// Tap this card (colon hex) instead of the first known one
        #[arg(long)]
        card: Option<String>,

        /// Enter a wrong PIN before the right one
        #[arg(long)]
        wrong_first: bool,
    },

    /// Run one device against an MQTT broker, with inputs read from stdin
    Run {
        #[arg(value_enum)]
        device: DeviceKind,

        /// Rig file (JSON) overriding identities, topics and timing
        #[arg(short, long)]
        rig: Option<PathBuf>,

        /// Broker host
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Broker port
        #[arg(long, default_value_t = 1883)]
        port: u16,

        /// Broker username; no authentication when absent
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        password: Option<String>,
    },

    /// Print the transport encoding of a PIN
    Encode { pin: String },

    /// Decode a transport-encoded PIN
    Decode { text: String },
}

fn load_rig(path: Option<&Path>) -> Result<Rig> {
    let file = match path {
        Some(path) => RigFile::load(path)?,
        None => RigFile::default(),
    };
    file.resolve()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Command::Simulate {
            rig,
            card,
            wrong_first,
        } => {
            let rig = load_rig(rig.as_deref())?;
            tracing::info!(keypad = %rig.keypad_id, door = %rig.door_id, rfid = %rig.rfid_id, "Rig ready");

            let report = simulate::run(&rig, &Script { card, wrong_first })?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Run {
            device,
            rig,
            host,
            port,
            username,
            password,
        } => {
            let rig = load_rig(rig.as_deref())?;
            let mqtt = MqttConfig::new(host, port)
                .with_credentials(username.unwrap_or_default(), password.unwrap_or_default());
            run::run(device, &rig, &mqtt).await?;
        }
        Command::Encode { pin } => println!("{}", encode_input(&pin)),
        Command::Decode { text } => {
            let pin = decode_input(&text).context("decoding input")?;
            println!("{pin}");
        }
    }

    Ok(())
}
