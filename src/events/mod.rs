//! Platform events as delivered by the gateway.

pub mod model;
pub mod voice;

pub use model::{
    GatewayEvent, InteractionEvent, MemberEvent, MessageDeleteEvent, MessageEvent, ReactionEvent,
    VoiceStateEvent,
};
pub use voice::VoiceTransition;
