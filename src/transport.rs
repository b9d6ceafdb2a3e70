//! Length-prefixed JSON frames for running the worker as a child process.
//!
//! Each frame is a little-endian `u32` byte length followed by one JSON message.
//! Incoming command frames are capped at [`MAX_FRAME_BYTES`]; reply frames grow with the
//! population and are only bounded by the `u32` length prefix.

use crate::engine::SimulationEngine;
use crate::protocol::{decode_command, WorkerReply};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{self, Read, Write};

const FRAME_LEN_BYTES: usize = std::mem::size_of::<u32>();
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;
pub const MAX_REPLY_FRAME_BYTES: usize = u32::MAX as usize;

pub fn send_frame<W, T>(writer: &mut W, value: &T) -> io::Result<()>
where
    W: Write,
    T: Serialize,
{
    let payload = serde_json::to_vec(value).map_err(to_io_error)?;
    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "frame too large"))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()
}

/// Reads one raw command frame payload.
pub fn recv_frame_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    recv_frame_bytes_within(reader, MAX_FRAME_BYTES)
}

/// Reads one raw frame payload of at most `limit` bytes.
pub fn recv_frame_bytes_within<R: Read>(reader: &mut R, limit: usize) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; FRAME_LEN_BYTES];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > limit {
        return Err(io::Error::new(io::ErrorKind::InvalidData, format!("frame of {len} bytes exceeds limit")));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

pub fn recv_frame<R, T>(reader: &mut R) -> io::Result<T>
where
    R: Read,
    T: DeserializeOwned,
{
    let payload = recv_frame_bytes(reader)?;
    serde_json::from_slice(&payload).map_err(to_io_error)
}

/// Reads one reply frame written by [`serve`].
pub fn recv_reply<R: Read>(reader: &mut R) -> io::Result<WorkerReply> {
    let payload = recv_frame_bytes_within(reader, MAX_REPLY_FRAME_BYTES)?;
    serde_json::from_slice(&payload).map_err(to_io_error)
}

fn to_io_error(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub handled: u64,
    pub ignored: u64,
    pub malformed: u64,
}

/// Serves commands from `reader` until EOF, writing one reply frame per handled command.
///
/// Unknown kinds are ignored and malformed frames skipped; neither produces a reply.
pub fn serve<R, W>(engine: &mut SimulationEngine, reader: &mut R, writer: &mut W) -> io::Result<SessionStats>
where
    R: Read,
    W: Write,
{
    let mut stats = SessionStats::default();
    loop {
        let payload = match recv_frame_bytes(reader) {
            Ok(payload) => payload,
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err),
        };
        let command = match decode_command(&payload) {
            Ok(Some(command)) => command,
            Ok(None) => {
                tracing::debug!("ignoring command of unknown kind");
                stats.ignored += 1;
                continue;
            }
            Err(err) => {
                tracing::warn!("skipping malformed command: {err:#}");
                stats.malformed += 1;
                continue;
            }
        };
        let reply: WorkerReply = engine.handle(command);
        send_frame(writer, &reply)?;
        stats.handled += 1;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::WorkerCommand;
    use crate::population::Bounds;
    use std::io::Cursor;

    fn raw_frame(buffer: &mut Vec<u8>, payload: &[u8]) {
        buffer.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buffer.extend_from_slice(payload);
    }

    #[test]
    fn framed_transport_round_trip() {
        let command = WorkerCommand::update_particles(1.0, 2.0, 16.0);
        let mut buffer = Vec::new();
        send_frame(&mut buffer, &command).expect("frame serialized");
        let mut cursor = Cursor::new(buffer);
        let decoded: WorkerCommand = recv_frame(&mut cursor).expect("frame decoded");
        assert_eq!(decoded, command);
    }

    #[test]
    fn oversized_frames_are_rejected() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(MAX_FRAME_BYTES as u32 + 1).to_le_bytes());
        let err = recv_frame_bytes(&mut Cursor::new(buffer)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn serve_replies_once_per_known_command() {
        let mut input = Vec::new();
        send_frame(&mut input, &WorkerCommand::init_stars(6, Bounds::cube(10.0))).expect("init frame");
        raw_frame(&mut input, br#"{"type": "warp-drive", "data": {}}"#);
        raw_frame(&mut input, b"{broken");
        send_frame(&mut input, &WorkerCommand::update_stars(0.0, 0.0, 16.0)).expect("update frame");

        let mut engine = SimulationEngine::with_seed(21);
        let mut output = Vec::new();
        let stats = serve(&mut engine, &mut Cursor::new(input), &mut output).expect("serve session");
        assert_eq!(stats, SessionStats { handled: 2, ignored: 1, malformed: 1 });
        assert_eq!(engine.tick(), 1, "ignored frames must not advance the clock");

        let mut replies = Cursor::new(output);
        let first = recv_reply(&mut replies).expect("first reply");
        let second = recv_reply(&mut replies).expect("second reply");
        assert_eq!(first, WorkerReply::StarsInitialized);
        match second {
            // Tick 1 -> slice 1 of ceil(6 / 3) = 2 -> indices 2 and 3.
            WorkerReply::StarsUpdated(updates) => {
                assert_eq!(updates.iter().map(|u| u.index).collect::<Vec<_>>(), vec![2, 3]);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
        assert!(recv_reply(&mut replies).is_err(), "no extra replies");
    }

    #[test]
    fn large_sweep_replies_keep_the_session_open() {
        const COUNT: usize = 400_000;
        let mut input = Vec::new();
        send_frame(&mut input, &WorkerCommand::init_particles(COUNT, Bounds::cube(100.0))).expect("init frame");
        for _ in 0..4 {
            send_frame(&mut input, &WorkerCommand::update_particles(0.0, 0.0, 16.0)).expect("update frame");
        }
        send_frame(&mut input, &WorkerCommand::init_stars(3, Bounds::cube(10.0))).expect("trailing frame");

        let mut engine = SimulationEngine::with_seed(22);
        let mut output = Vec::new();
        let stats = serve(&mut engine, &mut Cursor::new(input), &mut output).expect("serve session");
        assert_eq!(stats.handled, 6);

        let mut replies = Cursor::new(output);
        assert_eq!(recv_reply(&mut replies).expect("init reply"), WorkerReply::ParticlesInitialized);
        let mut sizes = Vec::new();
        for _ in 0..4 {
            match recv_reply(&mut replies).expect("update reply") {
                WorkerReply::ParticlesUpdated(updates) => sizes.push(updates.len()),
                other => panic!("unexpected reply: {other:?}"),
            }
        }
        assert_eq!(sizes, vec![COUNT / 4, COUNT / 4, COUNT / 4, COUNT]);
        assert_eq!(recv_reply(&mut replies).expect("trailing reply"), WorkerReply::StarsInitialized);
    }
}
