//! Serial link to the DMX interface.
//!
//! The link knows nothing about the protocol: it writes bytes and drives the
//! line-break condition. [`SerialLink`] talks to real hardware, [`NullLink`]
//! discards everything (simulation mode) and [`RecordingLink`] keeps every
//! event for inspection.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use embassy_time::Instant;
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// DMX512 line rate.
pub const BAUD_RATE: u32 = 250_000;

const WRITE_TIMEOUT: core::time::Duration = core::time::Duration::from_secs(1);

/// Abstract byte link to the fixture.
///
/// Implement this trait to support different serial backends.
/// The transmitter is generic over this trait.
pub trait Link: Send {
    /// Assert (`true`) or release (`false`) the line-break condition.
    fn set_break(&mut self, asserted: bool) -> io::Result<()>;

    /// Write one complete frame and flush it to the wire.
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Release the underlying device.
    fn close(&mut self) {}
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn set_break(&mut self, asserted: bool) -> io::Result<()> {
        (**self).set_break(asserted)
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).write_frame(frame)
    }

    fn close(&mut self) {
        (**self).close();
    }
}

/// Link over a real serial port configured for DMX (250000 baud, 8N2).
pub struct SerialLink {
    name: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Open the named port for DMX output.
    pub fn open(name: &str) -> Result<Self> {
        let port = serialport::new(name, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::Two)
            .flow_control(FlowControl::None)
            .timeout(WRITE_TIMEOUT)
            .open()?;
        info!(port = name, baud = BAUD_RATE, "serial link opened");
        Ok(Self {
            name: name.to_string(),
            port: Some(port),
        })
    }

    fn port(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial link closed"))
    }
}

impl Link for SerialLink {
    fn set_break(&mut self, asserted: bool) -> io::Result<()> {
        let port = self.port()?;
        let result = if asserted {
            port.set_break()
        } else {
            port.clear_break()
        };
        result.map_err(io::Error::from)
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        let port = self.port()?;
        port.write_all(frame)?;
        port.flush()
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!(port = %self.name, "serial link closed");
        }
    }
}

/// Summary of one serial port found on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSummary {
    pub name: String,
    pub description: String,
}

/// Enumerate serial ports on the host.
pub fn list_ports() -> Result<Vec<PortSummary>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|port| PortSummary {
            description: describe_port_type(&port.port_type),
            name: port.port_name,
        })
        .collect())
}

fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("USB serial");
            format!("{product} ({:04x}:{:04x})", usb.vid, usb.pid)
        }
        SerialPortType::PciPort => "PCI serial".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth serial".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}

/// Confirm the port exists and is not claimed by another process.
///
/// Opens and immediately closes the port. Any failure is
/// [`Error::DeviceUnavailable`].
pub fn probe_port(name: &str) -> Result<()> {
    let unavailable = |reason: String| Error::DeviceUnavailable {
        port: name.to_string(),
        reason,
    };

    let ports = list_ports().map_err(|err| unavailable(format!("cannot enumerate ports: {err}")))?;
    if !ports.iter().any(|port| port.name == name) {
        let known: Vec<&str> = ports.iter().map(|port| port.name.as_str()).collect();
        return Err(unavailable(format!(
            "port not found (available: {})",
            if known.is_empty() {
                "none".to_string()
            } else {
                known.join(", ")
            }
        )));
    }

    let probe = serialport::new(name, BAUD_RATE)
        .timeout(WRITE_TIMEOUT)
        .open()
        .map_err(|err| unavailable(format!("port is busy: {err}")))?;
    drop(probe);

    debug!(port = name, "device probe succeeded");
    Ok(())
}

/// Link that discards every frame.
#[derive(Debug, Default)]
pub struct NullLink {
    frames: u64,
}

impl NullLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames
    }
}

impl Link for NullLink {
    fn set_break(&mut self, _asserted: bool) -> io::Result<()> {
        Ok(())
    }

    fn write_frame(&mut self, _frame: &[u8]) -> io::Result<()> {
        self.frames += 1;
        Ok(())
    }

    fn close(&mut self) {
        debug!(frames = self.frames, "null link closed");
    }
}

/// Something that happened on a [`RecordingLink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    BreakAsserted(Instant),
    BreakReleased(Instant),
    Frame(Instant, Vec<u8>),
    Closed,
}

/// Link that records every event; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingLink {
    events: Arc<Mutex<Vec<LinkEvent>>>,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: LinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<LinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every frame written so far, in order.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                LinkEvent::Frame(_, bytes) => Some(bytes),
                _ => None,
            })
            .collect()
    }

    pub fn frame_count(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| matches!(event, LinkEvent::Frame(..)))
            .count()
    }

    pub fn is_closed(&self) -> bool {
        self.events().last() == Some(&LinkEvent::Closed)
    }
}

impl Link for RecordingLink {
    fn set_break(&mut self, asserted: bool) -> io::Result<()> {
        let now = Instant::now();
        self.push(if asserted {
            LinkEvent::BreakAsserted(now)
        } else {
            LinkEvent::BreakReleased(now)
        });
        Ok(())
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.push(LinkEvent::Frame(Instant::now(), frame.to_vec()));
        Ok(())
    }

    fn close(&mut self) {
        self.push(LinkEvent::Closed);
    }
}
