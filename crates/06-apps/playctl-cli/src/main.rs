//! Command-line front end: serve a simulated playback session or send it commands.

use anyhow::{bail, Context, Result};
use app::LoopReport;
use clap::{Args, Parser, Subcommand};
use log::info;
use mock::{ClipSpec, SimulatedHost};
use service_abi::StreamId;
use session::{run_session, SessionConfig, DEFAULT_PORT};
use std::path::PathBuf;
use transport_codecs::{Command, WireFormat};
use transport_fabric::{DatagramSender, SendOutcome};

/// Text rendering helpers used by the CLI commands.
mod render {
    use app::LoopReport;
    use std::net::SocketAddr;
    use transport_codecs::Command;

    /// Format the outcome of a finished session.
    pub fn report(report: &LoopReport) -> String {
        format!(
            "playback {} after {} iteration(s), {} command(s) dispatched",
            report.final_state, report.iterations, report.dispatched
        )
    }

    /// Format the confirmation for a sent datagram.
    pub fn sent(command: Command, bytes: usize, peer: Option<SocketAddr>) -> String {
        match peer {
            Some(peer) => format!("sent {command} ({bytes} byte(s)) to {peer}"),
            None => format!("sent {command} ({bytes} byte(s))"),
        }
    }
}

/// Drive a playback engine over a one-byte UDP command channel.
#[derive(Parser, Debug)]
#[command(author, version, about = "Remote-controlled recording playback", long_about = None)]
struct Cli {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Play a recording on the simulated engine and listen for commands.
    Serve(ServeArgs),
    /// Send one command datagram to a listening session.
    Send(SendArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Recording to play.
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// TOML session configuration; flags below take precedence.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Address to bind the command receiver on.
    #[arg(short, long)]
    address: Option<String>,
    /// Port to bind the command receiver on.
    #[arg(short, long)]
    port: Option<u16>,
    /// Extra passes over the recording.
    #[arg(short, long)]
    loop_count: Option<u32>,
    /// Stream to play (repeatable). Defaults to every stream in the file.
    #[arg(short, long = "stream", value_name = "NAME")]
    streams: Vec<String>,
    /// Stream advanced by STEP.
    #[arg(long, value_name = "NAME")]
    step_stream: Option<String>,
    /// Length of the simulated recording.
    #[arg(long, default_value_t = 300)]
    frames: u32,
}

impl ServeArgs {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)
                .with_context(|| format!("failed to load config {path:?}"))?,
            None => SessionConfig::default(),
        };
        if let Some(address) = &self.address {
            config.bind_address = address.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(loop_count) = self.loop_count {
            config.loop_count = loop_count;
        }
        if !self.streams.is_empty() {
            config.streams = self.streams.iter().map(StreamId::new).collect();
        }
        if let Some(step_stream) = &self.step_stream {
            config.step_stream = StreamId::new(step_stream);
        }
        config.validate()?;
        Ok(config)
    }

    fn clip(&self, config: &SessionConfig) -> ClipSpec {
        let mut clip = ClipSpec::default();
        clip.frames = self.frames.max(1);
        for stream in config.streams.iter().chain([&config.step_stream]) {
            if !clip.streams.contains(stream) {
                clip.streams.push(stream.clone());
            }
        }
        clip
    }
}

#[derive(Args, Debug)]
struct SendArgs {
    /// Command token (STEP, PLAY, TIME, EXIT, CALI, TICK) or numeric code.
    #[arg(value_parser = parse_command, value_name = "COMMAND")]
    command: Command,
    /// Send the ASCII token instead of the single code byte.
    #[arg(long)]
    text: bool,
    /// Address of the listening session.
    #[arg(short, long, default_value = "127.0.0.1")]
    address: String,
    /// Port of the listening session.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.action {
        Action::Serve(args) => {
            let report = serve(&args)?;
            println!("{}", render::report(&report));
        }
        Action::Send(args) => send(&args)?,
    }
    Ok(())
}

fn serve(args: &ServeArgs) -> Result<LoopReport> {
    let config = args.session_config()?;
    let host = SimulatedHost::new().with_clip(&args.file, args.clip(&config));
    info!(
        "serving {} on {}:{}",
        args.file.display(),
        config.bind_address,
        config.port
    );
    run_session(&host, &args.file, &config)
        .with_context(|| format!("playback of {} failed", args.file.display()))
}

fn send(args: &SendArgs) -> Result<()> {
    let sender = DatagramSender::connect(&args.address, args.port)
        .with_context(|| format!("failed to reach {}:{}", args.address, args.port))?;
    let format = if args.text {
        WireFormat::Text
    } else {
        WireFormat::Byte
    };
    match sender.send(args.command, format)? {
        SendOutcome::Sent(bytes) => {
            println!(
                "{}",
                render::sent(args.command, bytes, sender.peer_addr())
            );
            Ok(())
        }
        SendOutcome::NotConnected => bail!("sender is not connected"),
    }
}

fn parse_command(input: &str) -> Result<Command, String> {
    if let Ok(code) = input.parse::<u8>() {
        return Command::from_code(code)
            .filter(|command| command.is_some())
            .ok_or_else(|| format!("unknown command code {code}"));
    }
    input
        .to_ascii_uppercase()
        .parse::<Command>()
        .map_err(|err| err.to_string())
}
