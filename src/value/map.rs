//! Sass maps.
//!
//! Maps preserve insertion order, and keys are compared with Sass value
//! equality (so `1px` and `0.0254in` collide).  Since values are not
//! hashable (numbers compare up to unit conversion), the map is a small
//! association list; maps in stylesheets are rarely large enough for this
//! to matter.

use super::Value;

#[derive(Debug, Clone, Default)]
pub struct SassMap {
    pairs: Vec<(Value, Value)>,
}

impl SassMap {
    pub fn new() -> SassMap {
        SassMap { pairs: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Inserts, replacing an equal key in place but keeping its position.
    pub fn insert(&mut self, key: Value, value: Value) {
        for (k, v) in &mut self.pairs {
            if *k == key {
                *v = value;
                return;
            }
        }
        self.pairs.push((key, value));
    }

    pub fn remove(&mut self, key: &Value) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn keys(&self) -> Vec<Value> {
        self.pairs.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.pairs.iter().map(|(_, v)| v.clone()).collect()
    }

    /// `other`'s entries override this map's; new keys append in order.
    pub fn merge(&self, other: &SassMap) -> SassMap {
        let mut result = self.clone();
        for (k, v) in &other.pairs {
            result.insert(k.clone(), v.clone());
        }
        result
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.pairs.iter()
    }

    pub fn into_pairs(self) -> Vec<(Value, Value)> {
        self.pairs
    }
}

impl PartialEq for SassMap {
    /// Maps are equal when they hold the same associations, in any order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .pairs
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| ov == v))
    }
}

impl FromIterator<(Value, Value)> for SassMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> SassMap {
        let mut map = SassMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::number::Number;

    fn num(v: f64) -> Value {
        Value::Number(Number::new(v))
    }

    #[test]
    fn insertion_order_preserved() {
        let mut map = SassMap::new();
        map.insert(num(2.0), num(20.0));
        map.insert(num(1.0), num(10.0));
        assert_eq!(map.keys(), vec![num(2.0), num(1.0)]);
    }

    #[test]
    fn replacing_keeps_position() {
        let mut map = SassMap::new();
        map.insert(num(1.0), num(10.0));
        map.insert(num(2.0), num(20.0));
        map.insert(num(1.0), num(99.0));
        assert_eq!(map.keys(), vec![num(1.0), num(2.0)]);
        assert_eq!(map.get(&num(1.0)), Some(&num(99.0)));
    }

    #[test]
    fn equality_ignores_order() {
        let mut a = SassMap::new();
        a.insert(num(1.0), num(10.0));
        a.insert(num(2.0), num(20.0));
        let mut b = SassMap::new();
        b.insert(num(2.0), num(20.0));
        b.insert(num(1.0), num(10.0));
        assert_eq!(a, b);
    }

    #[test]
    fn unit_converted_keys_collide() {
        let mut map = SassMap::new();
        map.insert(Value::Number(Number::with_unit(1.0, "in")), num(1.0));
        assert!(map.contains_key(&Value::Number(Number::with_unit(96.0, "px"))));
    }
}
