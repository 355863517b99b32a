use kmbox_session::{InitScript, Session, SessionConfig};
use kmbox_transport::{Incoming, SerialTransport, StreamTransport, Transport};
use tokio::net::TcpStream;
use tracing::debug;

use crate::cmd::{parse_duration, DeviceArgs};
use crate::exit::{io_error, session_error, transport_error, CliResult};

const TCP_SCHEME: &str = "tcp://";

/// The transports the CLI can open.
pub enum Device {
    Serial(SerialTransport),
    Tcp(StreamTransport<TcpStream>),
}

impl Transport for Device {
    async fn write(&self, data: &[u8]) -> kmbox_transport::Result<()> {
        match self {
            Device::Serial(port) => port.write(data).await,
            Device::Tcp(stream) => stream.write(data).await,
        }
    }

    fn subscribe(&self) -> Incoming {
        match self {
            Device::Serial(port) => port.subscribe(),
            Device::Tcp(stream) => stream.subscribe(),
        }
    }

    fn listener_count(&self) -> usize {
        match self {
            Device::Serial(port) => port.listener_count(),
            Device::Tcp(stream) => stream.listener_count(),
        }
    }
}

pub async fn open(port: &str, baud: u32) -> CliResult<Device> {
    if let Some(addr) = port.strip_prefix(TCP_SCHEME) {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|err| io_error(&format!("failed to connect to {addr}"), err))?;
        debug!(addr, "connected to network bridge");
        return Ok(Device::Tcp(StreamTransport::new(stream)));
    }

    let serial = SerialTransport::open(port, baud)
        .map_err(|err| transport_error("failed to open device", err))?;
    Ok(Device::Serial(serial))
}

/// Open the device, replay the init script and return a ready session.
pub async fn connect(args: &DeviceArgs) -> CliResult<Session<Device>> {
    let config = SessionConfig {
        reply_timeout: Some(parse_duration(&args.timeout)?),
        ..SessionConfig::default()
    };

    let mut script = match &args.init_file {
        Some(path) => InitScript::from_json_file(path)
            .map_err(|err| session_error("failed to load init script", err))?,
        None => InitScript::empty(),
    };
    if let Some(delay) = &args.line_delay {
        script = script.with_line_delay(parse_duration(delay)?);
    }

    let device = open(&args.port, args.baud).await?;
    let session = Session::with_config(device, config);
    session
        .initialize(&script)
        .await
        .map_err(|err| session_error("initialization failed", err))?;
    Ok(session)
}
