//! Domain models carried by gateway events.
//!
//! Models are plain `serde` structs over the documented wire shapes. Absent
//! and `null` optional fields both decode to `None` unless a field says
//! otherwise.

pub mod channel;
pub mod emoji;
pub mod guild;
pub mod invite;
pub mod member;
pub mod presence;
pub mod user;

pub use channel::{Channel, ChannelType, GuildChannel, PartialChannel, PrivateChannel};
pub use emoji::KnownCustomEmoji;
pub use guild::{Guild, UnavailableGuild};
pub use invite::{ChannelRef, GuildRef, Invite, InviteMetadata, TargetUserType};
pub use member::Member;
pub use presence::{Activity, ClientStatus, MemberPresence, Status};
pub use user::{PartialUser, User};
