//! Tabla nativa: clave nativa → valores, en el orden en que aparecen en el
//! archivo. Los adaptadores de lofty la llenan y los traductores la leen.

use std::{borrow::Borrow, borrow::Cow};

use crate::codec;

/// Valor nativo representable como texto.
pub trait NativeValue {
    fn to_text(&self) -> Cow<'_, str>;
}

impl NativeValue for String {
    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeTable<K, V = String> {
    entries: Vec<(K, Vec<V>)>,
}

impl<K, V> Default for NativeTable<K, V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: PartialEq, V> NativeTable<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega un valor. Si la clave ya existe, el valor se suma a los suyos.
    pub fn push(&mut self, key: K, value: V) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&[V]>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.entries
            .iter()
            .find(|(k, _)| k.borrow() == key)
            .map(|(_, values)| values.as_slice())
    }

    /// Primera entrada cuya clave cumple `pred`.
    pub fn find<F>(&self, mut pred: F) -> Option<&[V]>
    where
        F: FnMut(&K) -> bool,
    {
        self.entries
            .iter()
            .find(|(k, _)| pred(k))
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: PartialEq, V: NativeValue> NativeTable<K, V> {
    /// Valor canónico de `key` (`""` si no existe).
    pub fn decode<Q>(&self, key: &Q) -> String
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        decode_slice(self.get(key))
    }
}

impl<K: PartialEq + AsRef<str>, V: NativeValue> NativeTable<K, V> {
    /// Como `decode`, comparando las claves sin distinguir mayúsculas ASCII.
    pub fn decode_ignore_ascii_case(&self, key: &str) -> String {
        decode_slice(self.find(|k| k.as_ref().eq_ignore_ascii_case(key)))
    }
}

/// Aplica la regla de decodificación a valores nativos arbitrarios.
pub fn decode_slice<V: NativeValue>(values: Option<&[V]>) -> String {
    let texts: Option<Vec<Cow<'_, str>>> = values.map(|vs| vs.iter().map(NativeValue::to_text).collect());
    codec::decode_values(texts.as_deref())
}

impl<K: PartialEq, V> FromIterator<(K, V)> for NativeTable<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (k, v) in iter {
            table.push(k, v);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_groups_values_by_key_in_order() {
        let table: NativeTable<String> = [
            ("artist".to_string(), "A".to_string()),
            ("title".to_string(), "T".to_string()),
            ("artist".to_string(), "B".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("artist").unwrap(), ["A", "B"]);
        assert_eq!(table.decode("artist"), "A;B");
        assert_eq!(table.decode("title"), "T");
        assert_eq!(table.decode("album"), "");
    }

    #[test]
    fn iteration_keeps_first_seen_order() {
        let mut table: NativeTable<String> = NativeTable::new();
        table.push("b".into(), "1".into());
        table.push("a".into(), "2".into());
        table.push("b".into(), "3".into());
        let keys: Vec<_> = table.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn case_insensitive_lookup() {
        let mut table: NativeTable<String> = NativeTable::new();
        table.push("TXXX:REPLAYGAIN_TRACK_GAIN".into(), "-2 dB".into());
        assert_eq!(table.decode("TXXX:replaygain_track_gain"), "");
        assert_eq!(table.decode_ignore_ascii_case("TXXX:replaygain_track_gain"), "-2 dB");
    }
}
