use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use clap::Parser;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

use waav_transcriber::{RtpPacket, ServerConfig, Transcriber, create_recognition_service};

/// Largest datagram accepted on the RTP socket
const MAX_DATAGRAM_SIZE: usize = 1500;

/// WaaV Transcriber - streams an RTP/Opus track to speech recognition
#[derive(Parser, Debug)]
#[command(name = "waav-transcriber")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        info!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    let service = create_recognition_service(config.stt_provider, &config.google_speech_config())
        .await
        .map_err(|e| anyhow!("Failed to create recognition service: {e}"))?;

    let transcriber = Arc::new(
        Transcriber::new(config.transcriber_config(), service)
            .map_err(|e| anyhow!("Failed to start transcriber: {e}"))?,
    );

    let mut results = transcriber
        .take_results()
        .ok_or_else(|| anyhow!("Result stream already taken"))?;
    let printer = tokio::spawn(async move {
        while let Some(result) = results.recv().await {
            match result {
                Ok(transcript) => info!(
                    text = %transcript.text,
                    is_final = transcript.is_final,
                    "Transcript"
                ),
                Err(e) => error!(error = %e, "Transcription error"),
            }
        }
        debug!("Result stream closed");
    });

    let socket = UdpSocket::bind(config.rtp_listen_addr)
        .await
        .map_err(|e| anyhow!("Failed to bind RTP socket on {}: {e}", config.rtp_listen_addr))?;
    info!(
        addr = %config.rtp_listen_addr,
        payload_type = config.rtp_payload_type,
        "Listening for RTP"
    );

    let payload_type = config.rtp_payload_type;
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = transcriber.finished() => {
                warn!("Transcriber exited");
                break;
            }
            received = socket.recv_from(&mut buf) => {
                let (len, peer) = match received {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(error = %e, "Failed to receive RTP datagram");
                        continue;
                    }
                };
                let packet = match RtpPacket::parse(&buf[..len]) {
                    Ok(packet) => packet,
                    Err(e) => {
                        debug!(%peer, error = %e, "Ignoring malformed RTP datagram");
                        continue;
                    }
                };
                if packet.payload_type != payload_type {
                    continue;
                }
                if let Err(e) = transcriber.submit(packet) {
                    warn!(error = %e, "Failed to submit RTP packet");
                }
            }
        }
    }

    transcriber.stop().await;
    if let Err(e) = printer.await {
        error!(error = %e, "Result printer task failed");
    }

    let stats = transcriber.stats();
    info!(
        sessions = stats.sessions_opened,
        rotations = stats.rotations,
        results = stats.results_published,
        bytes = stats.bytes_forwarded,
        "Transcriber stopped"
    );

    Ok(())
}
