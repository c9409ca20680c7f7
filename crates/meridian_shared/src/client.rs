//! Client types and the dense per-client lookup table.
//!
//! An observer declares its client type once at login. Encoders and
//! precomputed buffers are looked up by that type for the rest of the
//! session, so the lookup is a fixed array rather than a hash map.

use serde::{Deserialize, Serialize};

/// A client build that needs its own wire dialect.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    /// Desktop client.
    Desktop = 0,
    /// Android client.
    Android = 1,
    /// iOS client.
    Ios = 2,
}

impl ClientType {
    /// Number of client types.
    pub const COUNT: usize = 3;

    /// All client types in id order.
    pub const ALL: [Self; Self::COUNT] = [Self::Desktop, Self::Android, Self::Ios];

    /// Returns the dense id used to index [`ClientTypeMap`].
    #[must_use]
    pub const fn id(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for ClientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Desktop => "desktop",
            Self::Android => "android",
            Self::Ios => "ios",
        };
        f.write_str(name)
    }
}

/// A dense map from [`ClientType`] to `T`.
#[derive(Clone, Debug)]
pub struct ClientTypeMap<T> {
    slots: [Option<T>; ClientType::COUNT],
}

impl<T> ClientTypeMap<T> {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [None, None, None],
        }
    }

    /// Returns the value for `client`.
    #[inline]
    #[must_use]
    pub fn get(&self, client: ClientType) -> Option<&T> {
        self.slots[client.id()].as_ref()
    }

    /// Returns true if `client` has a value.
    #[inline]
    #[must_use]
    pub fn contains(&self, client: ClientType) -> bool {
        self.slots[client.id()].is_some()
    }

    /// Stores a value, returning the previous one.
    pub fn insert(&mut self, client: ClientType, value: T) -> Option<T> {
        self.slots[client.id()].replace(value)
    }

    /// Returns the value for `client`, building it first if absent.
    ///
    /// # Errors
    ///
    /// Returns the error of `build`; the map is left unchanged.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        client: ClientType,
        build: impl FnOnce() -> Result<T, E>,
    ) -> Result<&T, E> {
        let slot = &mut self.slots[client.id()];
        let value = match slot.take() {
            Some(value) => value,
            None => build()?,
        };
        Ok(slot.insert(value))
    }

    /// Removes the value for `client`.
    pub fn remove(&mut self, client: ClientType) -> Option<T> {
        self.slots[client.id()].take()
    }

    /// Returns true if no client has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Iterates over the populated entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ClientType, &T)> {
        ClientType::ALL
            .into_iter()
            .zip(self.slots.iter())
            .filter_map(|(client, slot)| slot.as_ref().map(|v| (client, v)))
    }

    /// Removes and yields every value.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.slots.iter_mut().filter_map(Option::take)
    }
}

impl<T> Default for ClientTypeMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A set of client types, one bit each.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientTypeSet(u8);

impl ClientTypeSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Adds a client type.
    pub fn insert(&mut self, client: ClientType) {
        self.0 |= 1 << client.id();
    }

    /// Returns true if the set holds `client`.
    #[must_use]
    pub const fn contains(self, client: ClientType) -> bool {
        self.0 & (1 << client.id()) != 0
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of client types in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates over the members in id order.
    pub fn iter(self) -> impl Iterator<Item = ClientType> {
        ClientType::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_insert_get() {
        let mut map: ClientTypeMap<&str> = ClientTypeMap::new();
        assert!(map.is_empty());
        assert!(map.insert(ClientType::Android, "a").is_none());
        assert_eq!(map.get(ClientType::Android), Some(&"a"));
        assert_eq!(map.get(ClientType::Desktop), None);
        assert_eq!(map.insert(ClientType::Android, "b"), Some("a"));
    }

    #[test]
    fn test_get_or_try_insert_with() {
        let mut map: ClientTypeMap<u32> = ClientTypeMap::new();
        let failed: Result<&u32, &str> = map.get_or_try_insert_with(ClientType::Ios, || Err("no"));
        assert_eq!(failed, Err("no"));
        assert!(!map.contains(ClientType::Ios));

        assert_eq!(map.get_or_try_insert_with(ClientType::Ios, || Ok::<_, ()>(4)), Ok(&4));
        assert_eq!(map.get_or_try_insert_with(ClientType::Ios, || Ok::<_, ()>(9)), Ok(&4));
    }

    #[test]
    fn test_map_drain() {
        let mut map: ClientTypeMap<u32> = ClientTypeMap::new();
        map.insert(ClientType::Desktop, 1);
        map.insert(ClientType::Ios, 3);

        let keys: Vec<_> = map.iter().map(|(c, _)| c).collect();
        assert_eq!(keys, vec![ClientType::Desktop, ClientType::Ios]);

        let drained: Vec<_> = map.drain().collect();
        assert_eq!(drained, vec![1, 3]);
        assert!(map.is_empty());
    }

    #[test]
    fn test_set() {
        let mut set = ClientTypeSet::EMPTY;
        set.insert(ClientType::Ios);
        set.insert(ClientType::Desktop);
        set.insert(ClientType::Desktop);

        assert_eq!(set.len(), 2);
        assert!(set.contains(ClientType::Ios));
        assert!(!set.contains(ClientType::Android));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![ClientType::Desktop, ClientType::Ios]);
    }
}
