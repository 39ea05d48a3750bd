//! Fixed-arity positional attribute slots
//!
//! The backend stores dynamic attributes in five positional columns per kind
//! (`attribute1..5`, `number1..5`, `date1..5`, `dropDown1..5`). The mapping
//! between a variable-length list and those slots lives here and nowhere
//! else.

use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Number of positional slots per attribute kind
pub const SLOT_COUNT: usize = 5;

/// Wire-level key prefix of a slot family
pub trait SlotPrefix {
    const PREFIX: &'static str;
}

/// `attribute1..5`
#[derive(Debug, Clone, Copy)]
pub struct TextSlot;

/// `number1..5`
#[derive(Debug, Clone, Copy)]
pub struct NumberSlot;

/// `date1..5`
#[derive(Debug, Clone, Copy)]
pub struct DateSlot;

/// `dropDown1..5`
#[derive(Debug, Clone, Copy)]
pub struct DropDownSlot;

impl SlotPrefix for TextSlot {
    const PREFIX: &'static str = "attribute";
}

impl SlotPrefix for NumberSlot {
    const PREFIX: &'static str = "number";
}

impl SlotPrefix for DateSlot {
    const PREFIX: &'static str = "date";
}

impl SlotPrefix for DropDownSlot {
    const PREFIX: &'static str = "dropDown";
}

/// Five optional values serialized under `{PREFIX}1..{PREFIX}5`
pub struct AttributeSlots<P, T> {
    values: [Option<T>; SLOT_COUNT],
    _prefix: PhantomData<fn() -> P>,
}

impl<P: SlotPrefix, T: Clone> AttributeSlots<P, T> {
    pub fn new(values: [Option<T>; SLOT_COUNT]) -> Self {
        Self { values, _prefix: PhantomData }
    }

    /// Map a positional list onto the slots
    ///
    /// Element `i` lands in slot `i + 1`; elements past the fifth are
    /// dropped.
    pub fn from_list<I>(list: I) -> Self
    where
        I: IntoIterator<Item = Option<T>>,
    {
        let mut values: [Option<T>; SLOT_COUNT] = Default::default();
        for (slot, value) in values.iter_mut().zip(list) {
            *slot = value;
        }
        Self::new(values)
    }

    /// Inverse of [`from_list`](Self::from_list) for hydration
    ///
    /// Slots 1 through the highest filled one are materialized, empty gaps
    /// included, so every value keeps its position. Slot 1 always is.
    pub fn to_list(&self) -> Vec<Option<T>> {
        let len = self.values.iter().rposition(Option::is_some).map_or(1, |last| last + 1);
        self.values[..len].to_vec()
    }

    pub fn get(&self, position: usize) -> Option<&T> {
        self.values.get(position).and_then(Option::as_ref)
    }

    pub fn values(&self) -> &[Option<T>; SLOT_COUNT] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Wire key of a 0-based position
    pub fn key(position: usize) -> String {
        format!("{}{}", P::PREFIX, position + 1)
    }
}

/// Parse `{PREFIX}{n}` into a 0-based slot position
fn slot_position<P: SlotPrefix>(key: &str) -> Option<usize> {
    let digits = key.strip_prefix(P::PREFIX)?;
    let n: usize = digits.parse().ok()?;
    (1..=SLOT_COUNT).contains(&n).then(|| n - 1)
}

impl<P, T: Clone> Clone for AttributeSlots<P, T> {
    fn clone(&self) -> Self {
        Self { values: self.values.clone(), _prefix: PhantomData }
    }
}

impl<P, T> Default for AttributeSlots<P, T> {
    fn default() -> Self {
        Self { values: Default::default(), _prefix: PhantomData }
    }
}

impl<P, T: PartialEq> PartialEq for AttributeSlots<P, T> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<P: SlotPrefix, T: fmt::Debug> fmt::Debug for AttributeSlots<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSlots")
            .field("prefix", &P::PREFIX)
            .field("values", &self.values)
            .finish()
    }
}

impl<P: SlotPrefix, T: Serialize> Serialize for AttributeSlots<P, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(SLOT_COUNT))?;
        for (position, value) in self.values.iter().enumerate() {
            map.serialize_entry(&format!("{}{}", P::PREFIX, position + 1), value)?;
        }
        map.end()
    }
}

impl<'de, P: SlotPrefix, T: DeserializeOwned> Deserialize<'de> for AttributeSlots<P, T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SlotsVisitor::<P, T>(PhantomData))
    }
}

struct SlotsVisitor<P, T>(PhantomData<fn() -> (P, T)>);

impl<'de, P: SlotPrefix, T: DeserializeOwned> Visitor<'de> for SlotsVisitor<P, T> {
    type Value = AttributeSlots<P, T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map with {}1..{}{} keys", P::PREFIX, P::PREFIX, SLOT_COUNT)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut values: [Option<T>; SLOT_COUNT] = Default::default();

        while let Some(key) = map.next_key::<String>()? {
            let Some(position) = slot_position::<P>(&key) else {
                map.next_value::<de::IgnoredAny>()?;
                continue;
            };

            // Blank strings are how the backend reports an unused slot
            let raw: serde_json::Value = map.next_value()?;
            values[position] = match raw {
                serde_json::Value::Null => None,
                serde_json::Value::String(ref s) if s.trim().is_empty() => None,
                other => Some(serde_json::from_value(other).map_err(|e| {
                    de::Error::custom(format_args!("invalid value for {}: {}", key, e))
                })?),
            };
        }

        Ok(AttributeSlots { values, _prefix: PhantomData })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type Texts = AttributeSlots<TextSlot, String>;
    type Numbers = AttributeSlots<NumberSlot, f64>;

    #[test]
    fn test_slot_position_parsing() {
        assert_eq!(slot_position::<TextSlot>("attribute1"), Some(0));
        assert_eq!(slot_position::<TextSlot>("attribute5"), Some(4));
        assert_eq!(slot_position::<TextSlot>("attribute6"), None);
        assert_eq!(slot_position::<TextSlot>("attribute0"), None);
        assert_eq!(slot_position::<DropDownSlot>("dropDown3"), Some(2));
        assert_eq!(slot_position::<DateSlot>("dropDown3"), None);
    }

    #[test]
    fn test_from_list_is_positional() {
        let slots = Texts::from_list(vec![Some("red".to_string()), None, Some("xl".to_string())]);
        assert_eq!(slots.get(0).map(String::as_str), Some("red"));
        assert_eq!(slots.get(1), None);
        assert_eq!(slots.get(2).map(String::as_str), Some("xl"));
    }

    #[test]
    fn test_from_list_drops_overflow() {
        let slots = Numbers::from_list((1..=7).map(|n| Some(n as f64)));
        assert_eq!(slots.get(4), Some(&5.0));
        assert_eq!(slots.to_list().len(), 5);
    }

    #[test]
    fn test_to_list_keeps_first_slot_only_when_empty() {
        assert_eq!(Texts::default().to_list(), vec![None]);

        let slots = Texts::from_list(vec![None, Some("b".to_string())]);
        assert_eq!(slots.to_list(), vec![None, Some("b".to_string())]);
    }

    #[test]
    fn test_to_list_keeps_gaps_and_trims_trailing_empties() {
        let list = vec![Some("a".to_string()), None, Some("c".to_string()), None, None];
        let slots = Texts::from_list(list.clone());

        assert_eq!(slots.to_list(), list[..3].to_vec());
        assert_eq!(Texts::from_list(slots.to_list()), slots);
    }

    #[test]
    fn test_serialize_uses_positional_keys() {
        let slots = Numbers::from_list(vec![Some(1.5), Some(2.0)]);
        let value = serde_json::to_value(&slots).unwrap();
        assert_eq!(
            value,
            json!({"number1": 1.5, "number2": 2.0, "number3": null, "number4": null, "number5": null})
        );
    }

    #[test]
    fn test_deserialize_ignores_foreign_keys_and_blanks() {
        let value = json!({
            "attribute1": "steel",
            "attribute2": "",
            "attribute3": "  ",
            "attribute4": "matte",
            "number1": 4,
            "productName": "Bolt"
        });
        let slots: Texts = serde_json::from_value(value).unwrap();
        assert_eq!(
            slots.to_list(),
            vec![Some("steel".to_string()), None, None, Some("matte".to_string())]
        );
    }

    #[test]
    fn test_deserialize_rejects_wrong_type() {
        let value = json!({"number1": "not a number"});
        assert!(serde_json::from_value::<Numbers>(value).is_err());
    }
}
