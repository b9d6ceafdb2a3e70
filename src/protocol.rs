use crate::population::Bounds;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Commands accepted by the worker. On the wire: `{"type": "<kind>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum WorkerCommand {
    InitParticles(InitRequest),
    InitStars(InitRequest),
    UpdateParticles(UpdateRequest),
    UpdateStars(UpdateRequest),
    SetViewport(ViewportRequest),
}

/// Replies emitted by the worker, one per handled command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum WorkerReply {
    ParticlesInitialized,
    StarsInitialized,
    ParticlesUpdated(Vec<ParticleUpdate>),
    StarsUpdated(Vec<StarUpdate>),
    ViewportUpdated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitRequest {
    pub count: usize,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[serde(default, alias = "mouseX")]
    pub pointer_x: f32,
    #[serde(default, alias = "mouseY")]
    pub pointer_y: f32,
    #[serde(default)]
    pub delta_time: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRequest {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleUpdate {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationRecord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarUpdate {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation: RotationRecord,
    pub scale: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    InitParticles,
    InitStars,
    UpdateParticles,
    UpdateStars,
    SetViewport,
}

impl CommandKind {
    pub const ALL: [CommandKind; 5] = [
        CommandKind::InitParticles,
        CommandKind::InitStars,
        CommandKind::UpdateParticles,
        CommandKind::UpdateStars,
        CommandKind::SetViewport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::InitParticles => "init-particles",
            CommandKind::InitStars => "init-stars",
            CommandKind::UpdateParticles => "update-particles",
            CommandKind::UpdateStars => "update-stars",
            CommandKind::SetViewport => "set-viewport",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == label)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WorkerCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            WorkerCommand::InitParticles(_) => CommandKind::InitParticles,
            WorkerCommand::InitStars(_) => CommandKind::InitStars,
            WorkerCommand::UpdateParticles(_) => CommandKind::UpdateParticles,
            WorkerCommand::UpdateStars(_) => CommandKind::UpdateStars,
            WorkerCommand::SetViewport(_) => CommandKind::SetViewport,
        }
    }

    pub fn init_particles(count: usize, bounds: Bounds) -> Self {
        WorkerCommand::InitParticles(InitRequest { count, bounds })
    }

    pub fn init_stars(count: usize, bounds: Bounds) -> Self {
        WorkerCommand::InitStars(InitRequest { count, bounds })
    }

    pub fn update_particles(pointer_x: f32, pointer_y: f32, delta_time: f32) -> Self {
        WorkerCommand::UpdateParticles(UpdateRequest { pointer_x, pointer_y, delta_time })
    }

    pub fn update_stars(pointer_x: f32, pointer_y: f32, delta_time: f32) -> Self {
        WorkerCommand::UpdateStars(UpdateRequest { pointer_x, pointer_y, delta_time })
    }

    pub fn set_viewport(width: f32, height: f32) -> Self {
        WorkerCommand::SetViewport(ViewportRequest { width, height })
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

/// Decodes a JSON command payload.
///
/// Unknown kinds decode to `Ok(None)` so newer callers can talk to older workers.
/// A known kind with a malformed body is an error.
pub fn decode_command(payload: &[u8]) -> Result<Option<WorkerCommand>> {
    let envelope: Envelope = serde_json::from_slice(payload).context("command is not a typed JSON object")?;
    let Some(kind) = CommandKind::from_label(&envelope.kind) else {
        return Ok(None);
    };
    let command = serde_json::from_slice(payload).with_context(|| format!("malformed '{kind}' command"))?;
    Ok(Some(command))
}
