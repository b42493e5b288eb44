use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use telepatia_chat::config::DEFAULT_CONFIG_PATH;
use telepatia_chat::error::SendPath;
use telepatia_chat::{
    stub, ui, ApiClient, Config, Conversation, DeviceConfig, DeviceFactory, DeviceSource,
    SendStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{warn, Level};

#[derive(Parser)]
#[command(name = "telepatia-chat")]
#[command(about = "Chat de texto y voz con el backend de Telepatía AI")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Override the backend base URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat (default)
    Chat {
        /// Replay this audio file instead of using the microphone
        #[arg(long)]
        audio_file: Option<PathBuf>,
    },
    /// Serve the local stub backend
    Stub {
        #[arg(short, long)]
        port: Option<u16>,

        /// Delay every reply, to exercise client timeouts
        #[arg(long)]
        delay_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = Config::load(&cli.config)?;
    if let Some(url) = cli.backend_url {
        cfg.backend.base_url = url;
    }

    match cli.command.unwrap_or(Command::Chat { audio_file: None }) {
        Command::Chat { audio_file } => {
            let source = audio_file.map_or(DeviceSource::Microphone, DeviceSource::File);
            run_chat(cfg, source).await
        }
        Command::Stub { port, delay_ms } => {
            if let Some(port) = port {
                cfg.stub.port = port;
            }
            if let Some(delay_ms) = delay_ms {
                cfg.stub.delay_ms = delay_ms;
            }
            stub::serve(&cfg.stub).await
        }
    }
}

async fn run_chat(cfg: Config, source: DeviceSource) -> Result<()> {
    let backend = Arc::new(ApiClient::new(&cfg.backend.base_url, cfg.backend.timeouts())?);
    let conversation = Arc::new(Conversation::new(backend, cfg.audio.conversation()));
    let device_config = DeviceConfig {
        fragment_bytes: cfg.audio.fragment_bytes,
    };
    let recordings_dir = cfg.audio.recordings_dir();

    println!("{}\n{}\n", ui::TITLE, ui::SUBTITLE);
    println!("{}\n", ui::HELP);

    // Print messages as the conversation appends them
    let mut updates = conversation.subscribe();
    let printer = tokio::spawn(async move {
        let mut number = 0;
        loop {
            match updates.recv().await {
                Ok(message) => {
                    number += 1;
                    println!("{}", ui::render(number, &message));
                    if ui::awaits_reply(&message) {
                        println!("{}", ui::TYPING_INDICATOR);
                    }
                }
                Err(RecvError::Lagged(skipped)) => number += skipped as usize,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut sends: Vec<JoinHandle<()>> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        sends.retain(|task| !task.is_finished());
        let line = line.trim();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "" => {}
            "/quit" | "/salir" => break,
            "/help" => println!("{}", ui::HELP),
            "/history" => {
                let transcript = conversation.transcript().await;
                for (i, message) in transcript.messages().iter().enumerate() {
                    println!("{}", ui::render(i + 1, message));
                }
            }
            "/record" => {
                let device = match DeviceFactory::create(source.clone(), device_config.clone()) {
                    Ok(device) => device,
                    Err(e) => {
                        warn!("Failed to create capture device: {:#}", e);
                        eprintln!("{}", telepatia_chat::error::MICROPHONE_DENIED);
                        continue;
                    }
                };
                match conversation.start_recording(device).await {
                    Ok(_) => println!("{}", ui::RECORDING_INDICATOR),
                    Err(e) => eprintln!("{}", e.user_message(SendPath::Voice)),
                }
            }
            "/stop" => {
                let conversation = Arc::clone(&conversation);
                sends.push(tokio::spawn(async move {
                    report(conversation.stop_recording().await);
                }));
            }
            "/save" => {
                let transcript = conversation.transcript().await;
                let audio = arg
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| transcript.get(i))
                    .and_then(|m| m.audio().map(|audio| (m.id(), audio.clone())));
                match audio {
                    Some((id, audio)) => match audio.save_to(&recordings_dir, &id.to_string()) {
                        Ok(path) => println!("Guardado en {}", path.display()),
                        Err(e) => eprintln!("No se pudo guardar el audio: {:#}", e),
                    },
                    None => eprintln!("No hay un mensaje de voz con ese número"),
                }
            }
            _ if command.starts_with('/') => {
                eprintln!("Comando desconocido: {}", command);
            }
            _ => {
                let conversation = Arc::clone(&conversation);
                let text = line.to_string();
                sends.push(tokio::spawn(async move {
                    report(conversation.send_text(&text).await);
                }));
            }
        }
    }

    // Let in-flight sends finish before exiting
    for task in sends {
        let _ = task.await;
    }
    if conversation.is_recording().await {
        report(conversation.stop_recording().await);
    }
    drop(conversation);
    let _ = printer.await;

    Ok(())
}

fn report(status: SendStatus) {
    match status {
        SendStatus::Busy => eprintln!("{}", telepatia_chat::error::SEND_IN_PROGRESS),
        SendStatus::NotRecording => eprintln!("No hay ninguna grabación en curso"),
        SendStatus::Delivered | SendStatus::Failed | SendStatus::Empty => {}
    }
}
