//! Subcommand implementations.

use crate::cli::{OutputFormat, ServiceArgs};
use crate::render::render_text;
use anyhow::{Context, Result};
use cardlink_decoder::Profile;
use cardlink_network::{CardReadManager, EmulatorConfig, PassiveListener, ReaderServiceEmulator};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::info;

/// Card pushed by `emulate` when no message file is given.
const SAMPLE_MESSAGE: &str = r#"{"result":{"E004":["ID1","Dupont","Jean","15-06-19-85","M","","CampX","Djibouti","Rep. Djibouti","12345","01-01-20-20","DOC123","","Arr1","","ComA"],"E006":[{"Nom":"Dupont Marie","Sexe":"F","Date_Naissance":"02/03/2010"}],"E007":null},"time_taken":"120ms"}"#;

pub async fn read(service: &ServiceArgs, timeout_ms: u64, format: OutputFormat) -> Result<()> {
    let config = service.reader_config_with_timeout(timeout_ms)?;
    let mut manager = CardReadManager::new(config);

    let profile = manager.read_profile().await.context("card read failed")?;

    print_profile(&profile, format)
}

pub async fn listen(service: &ServiceArgs) -> Result<()> {
    let config = service.reader_config()?;
    let listener = PassiveListener::new(&config);
    let mut feed = listener
        .listen()
        .await
        .with_context(|| format!("cannot open passive feed {}", listener.endpoint()))?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, closing feed");
                break;
            }
            message = feed.next_message() => match message {
                Some(Ok(message)) => println!("{message}"),
                Some(Err(e)) => {
                    feed.close().await;
                    return Err(e).context("passive feed failed");
                }
                None => break,
            },
        }
    }

    let received = feed.close().await;
    info!(messages = received, "Passive feed closed");
    Ok(())
}

pub async fn decode(input: &Path, format: OutputFormat) -> Result<()> {
    let text = read_input(input).await?;
    let profile = cardlink_decoder::decode_str(&text)
        .with_context(|| format!("cannot decode {}", input.display()))?;

    print_profile(&profile, format)
}

pub async fn emulate(
    bind: SocketAddr,
    message: Option<&Path>,
    delay_ms: u64,
    hold_open: bool,
) -> Result<()> {
    let frame = match message {
        Some(path) => read_input(path).await?,
        None => SAMPLE_MESSAGE.to_string(),
    };

    let config = EmulatorConfig {
        bind_addr: bind,
        ..EmulatorConfig::default()
    }
    .with_frame(frame)
    .with_delay(Duration::from_millis(delay_ms))
    .with_hold_open(hold_open);

    let emulator = ReaderServiceEmulator::bind(config).await?;
    println!("Reader service emulator on {}", emulator.endpoint()?);

    tokio::select! {
        result = emulator.serve() => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping emulator"),
    }
    Ok(())
}

/// Read a file, or stdin for `-`.
async fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("cannot read stdin")?;
        return Ok(text);
    }

    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))
}

fn print_profile(profile: &Profile, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(profile)?),
        OutputFormat::Text => println!("{}", render_text(profile)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Emulator on an ephemeral port pushing `frame`, and the service args
    /// pointing at it.
    async fn emulated_service(frame: &str) -> (ReaderServiceEmulator, ServiceArgs) {
        let config = EmulatorConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..EmulatorConfig::default()
        }
        .with_frame(frame);
        let emulator = ReaderServiceEmulator::bind(config).await.unwrap();
        let service = ServiceArgs {
            host: "127.0.0.1".to_string(),
            port: emulator.endpoint().unwrap().port(),
        };
        (emulator, service)
    }

    fn message_file(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[rstest]
    #[case(OutputFormat::Json)]
    #[case(OutputFormat::Text)]
    #[tokio::test]
    async fn test_read_prints_emulated_card(#[case] format: OutputFormat) {
        let (emulator, service) = emulated_service(SAMPLE_MESSAGE).await;
        let server = tokio::spawn(async move { emulator.serve_one().await });

        read(&service, 2000, format).await.unwrap();
        assert_eq!(server.await.unwrap().unwrap(), "/read-card");
    }

    #[tokio::test]
    async fn test_read_reports_undecodable_card() {
        let (emulator, service) = emulated_service("card inserted").await;
        let server = tokio::spawn(async move { emulator.serve_one().await });

        let error = read(&service, 2000, OutputFormat::Json).await.unwrap_err();
        assert!(format!("{error:#}").starts_with("card read failed: Unreadable card data"));
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_read_reports_unreachable_service() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        drop(taken);

        let service = ServiceArgs {
            host: "127.0.0.1".to_string(),
            port,
        };
        let error = read(&service, 2000, OutputFormat::Text).await.unwrap_err();
        assert!(format!("{error:#}").contains("Reader service unavailable"));
    }

    #[tokio::test]
    async fn test_read_rejects_invalid_host() {
        let service = ServiceArgs {
            host: "bad/host".to_string(),
            port: 8081,
        };
        assert!(read(&service, 2000, OutputFormat::Json).await.is_err());
    }

    #[rstest]
    #[case(OutputFormat::Json)]
    #[case(OutputFormat::Text)]
    #[tokio::test]
    async fn test_decode_message_file(#[case] format: OutputFormat) {
        let file = message_file(SAMPLE_MESSAGE);
        decode(file.path(), format).await.unwrap();
    }

    #[tokio::test]
    async fn test_decode_invalid_message_file() {
        let file = message_file(r#"{"result": {"E006": []}}"#);

        let error = decode(file.path(), OutputFormat::Json).await.unwrap_err();
        let message = format!("{error:#}");
        assert!(message.contains(&file.path().display().to_string()));
        assert!(message.contains("result.E004"));
    }

    #[tokio::test]
    async fn test_decode_missing_file() {
        let error = decode(Path::new("/nonexistent/card.json"), OutputFormat::Json)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("cannot read /nonexistent/card.json"));
    }

    #[test]
    fn test_sample_message_decodes() {
        let profile = cardlink_decoder::decode_str(SAMPLE_MESSAGE).unwrap();
        assert_eq!(profile.full_name(), "Dupont Jean");
        assert_eq!(profile.birth_date(), "15/06/1985");
        assert_eq!(profile.issue_date(), "01/01/2020");
    }

    #[tokio::test]
    async fn test_read_input_missing_file() {
        let error = read_input(Path::new("/nonexistent/card.json")).await.unwrap_err();
        assert!(error.to_string().contains("/nonexistent/card.json"));
    }
}
