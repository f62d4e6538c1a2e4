//! Privilege maps: capability id to absolute expiry

use crate::error::Result;
use crate::token::pack::Packer;
use std::fmt;

/// Capabilities inside an audio/video channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ChannelPrivilege {
    JoinChannel = 1,
    PublishAudio = 2,
    PublishVideo = 3,
    PublishData = 4,
}

impl ChannelPrivilege {
    pub const ALL: [ChannelPrivilege; 4] = [
        ChannelPrivilege::JoinChannel,
        ChannelPrivilege::PublishAudio,
        ChannelPrivilege::PublishVideo,
        ChannelPrivilege::PublishData,
    ];

    pub fn id(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for ChannelPrivilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelPrivilege::JoinChannel => write!(f, "join_channel"),
            ChannelPrivilege::PublishAudio => write!(f, "publish_audio"),
            ChannelPrivilege::PublishVideo => write!(f, "publish_video"),
            ChannelPrivilege::PublishData => write!(f, "publish_data"),
        }
    }
}

/// Capabilities of a messaging session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessagingPrivilege {
    Login = 1,
}

impl MessagingPrivilege {
    pub fn id(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for MessagingPrivilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessagingPrivilege::Login => write!(f, "login"),
        }
    }
}

/// An immutable set of (capability id, absolute expiry) pairs
///
/// Packed as `[count:u16]` followed by `[id:u16][expiry:u32]` entries in
/// ascending id order. Insertion order never reaches the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeMap {
    entries: Vec<(u16, u32)>,
}

impl PrivilegeMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return a map that also grants `id` until `expiry`
    ///
    /// Granting an id twice keeps the later expiry.
    #[must_use]
    pub fn with(mut self, id: u16, expiry: u32) -> Self {
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = expiry,
            None => self.entries.push((id, expiry)),
        }
        self
    }

    #[must_use]
    pub fn with_channel(self, privilege: ChannelPrivilege, expiry: u32) -> Self {
        self.with(privilege.id(), expiry)
    }

    #[must_use]
    pub fn with_messaging(self, privilege: MessagingPrivilege, expiry: u32) -> Self {
        self.with(privilege.id(), expiry)
    }

    pub fn get(&self, id: u16) -> Option<u32> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, expiry)| *expiry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in wire order
    pub fn sorted(&self) -> Vec<(u16, u32)> {
        let mut sorted = self.entries.clone();
        sorted.sort_unstable_by_key(|(id, _)| *id);
        sorted
    }

    pub fn pack_into(&self, packer: &mut Packer) -> Result<()> {
        packer.put_len(self.entries.len(), "privilege map")?;
        for (id, expiry) in self.sorted() {
            packer.put_u16(id).put_u32(expiry);
        }
        Ok(())
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut packer = Packer::with_capacity(2 + self.entries.len() * 6);
        self.pack_into(&mut packer)?;
        Ok(packer.finish())
    }
}

impl FromIterator<(u16, u32)> for PrivilegeMap {
    fn from_iter<T: IntoIterator<Item = (u16, u32)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(PrivilegeMap::new(), |map, (id, expiry)| map.with(id, expiry))
    }
}
