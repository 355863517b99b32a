//! End-to-end sessions against a scripted device on the other end of an
//! in-memory duplex stream.

use std::time::Duration;

use kmbox::frame::{decode, encode, wrap_reply, Alphabet};
use kmbox::session::{Command, InitScript, Session, SessionConfig, SessionError};
use kmbox::transport::{StreamTransport, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;

/// Replies `echo:<text>` to every `r('...')`, installs `nkb3('...')`
/// alphabets, and reports every line it saw.
async fn run_device(mut stream: DuplexStream, seen: mpsc::UnboundedSender<String>) {
    let mut alphabet = Alphabet::default();
    let mut pending = Vec::new();
    let mut buf = [0u8; 256];

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        pending.extend_from_slice(&buf[..n]);

        while let Some(pos) = pending.windows(2).position(|w| w == b"\r\n") {
            let line: Vec<u8> = pending.drain(..pos + 2).take(pos).collect();
            let line = String::from_utf8(line).expect("device expects text lines");
            if line.is_empty() {
                continue;
            }
            let _ = seen.send(line.clone());

            if let Some(body) = quoted_arg(&line, "r") {
                let text = decode(body, &alphabet).expect("request should decode");
                let mut reply = b"echo:".to_vec();
                reply.extend_from_slice(&text);
                let framed = wrap_reply(encode(&reply, &alphabet).as_bytes());

                // Split the reply to exercise reassembly.
                let (head, tail) = framed.split_at(framed.len() / 2);
                stream.write_all(b">>> ").await.unwrap();
                stream.write_all(head).await.unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
                stream.write_all(tail).await.unwrap();
                stream.write_all(b"\r\n>>> ").await.unwrap();
            } else if let Some(body) = quoted_arg(&line, "nkb3") {
                alphabet = Alphabet::new(body).expect("device received invalid alphabet");
            }
        }
    }
}

fn quoted_arg<'a>(line: &'a str, function: &str) -> Option<&'a str> {
    line.strip_prefix(function)?
        .strip_prefix("('")?
        .strip_suffix("')")
}

fn connect() -> (
    Session<StreamTransport<DuplexStream>>,
    mpsc::UnboundedReceiver<String>,
) {
    let (client, device) = tokio::io::duplex(4096);
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_device(device, seen_tx));

    let config = SessionConfig {
        reply_timeout: Some(Duration::from_secs(2)),
        ..SessionConfig::default()
    };
    (Session::with_config(StreamTransport::new(client), config), seen_rx)
}

fn init_script() -> InitScript {
    InitScript::new(["import km", "km.init()"]).with_line_delay(Duration::from_millis(1))
}

#[tokio::test]
async fn initialize_then_round_trip() {
    let (session, mut seen) = connect();

    session.initialize(&init_script()).await.unwrap();
    let reply = session.send_command("km.version()").await.unwrap();

    assert_eq!(reply, "echo:km.version()");
    assert_eq!(seen.recv().await.unwrap(), "import km");
    assert_eq!(seen.recv().await.unwrap(), "km.init()");
    assert_eq!(
        seen.recv().await.unwrap(),
        format!("r('{}')", encode(b"km.version()", &Alphabet::default()))
    );
    assert_eq!(session.transport().listener_count(), 0);
}

#[tokio::test]
async fn requests_before_initialize_are_refused() {
    let (session, _seen) = connect();

    assert!(matches!(
        session.send_command("km.version()").await,
        Err(SessionError::NotInitialized)
    ));
}

#[tokio::test]
async fn sequential_requests_each_get_their_reply() {
    let (session, _seen) = connect();
    session.initialize(&init_script()).await.unwrap();

    for text in ["one", "two", "three"] {
        let reply = session.send_command(text).await.unwrap();
        assert_eq!(reply, format!("echo:{text}"));
    }
}

#[tokio::test]
async fn alphabet_swap_is_honored_by_both_ends() {
    let (session, _seen) = connect();
    session.initialize(&init_script()).await.unwrap();

    let chosen = session.random_alphabet().await.unwrap();
    assert_ne!(chosen.as_str(), kmbox::frame::DEFAULT_ALPHABET);

    let reply = session.send_command("after swap").await.unwrap();
    assert_eq!(reply, "echo:after swap");
}

#[tokio::test]
async fn custom_commands_share_the_request_cycle() {
    let (session, _seen) = connect();
    session.initialize(&init_script()).await.unwrap();

    let reply = session
        .execute(&Command::reply_request("km.move(1,2)"))
        .await
        .unwrap();
    assert_eq!(reply, b"echo:km.move(1,2)");
}

#[tokio::test]
async fn silent_device_times_out() {
    let (client, _device) = tokio::io::duplex(1024);
    let config = SessionConfig {
        reply_timeout: Some(Duration::from_millis(50)),
        ..SessionConfig::default()
    };
    let session = Session::with_config(StreamTransport::new(client), config);
    session.initialize(&InitScript::empty()).await.unwrap();

    let err = session.send_command("hello").await.unwrap_err();
    assert!(matches!(err, SessionError::Timeout(_)));
    assert_eq!(session.transport().listener_count(), 0);
}

#[tokio::test]
async fn device_disconnect_fails_pending_request() {
    let (client, device) = tokio::io::duplex(1024);
    let session = Session::new(StreamTransport::new(client));
    session.initialize(&InitScript::empty()).await.unwrap();

    let request = session.send_command("hello");
    tokio::pin!(request);
    assert!(tokio::time::timeout(Duration::from_millis(20), &mut request)
        .await
        .is_err());
    drop(device);

    let err = request.await.unwrap_err();
    assert!(matches!(err, SessionError::Transport(_)), "{err:?}");
}
