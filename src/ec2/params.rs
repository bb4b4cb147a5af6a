use std::collections::HashMap;

/// The flat key/value parameters of an EC2 Query API request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(HashMap<String, String>);

impl Params {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self(params)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn scalar(&self, key: &str, default: &str) -> String {
        decode_scalar(&self.0, key, default)
    }

    pub fn owned(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    pub fn indexed_list(&self, mask: &str) -> Vec<String> {
        decode_indexed_list(mask, &self.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(HashMap::from_iter(iter))
    }
}

impl Extend<(String, String)> for Params {
    fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

pub fn decode_scalar(params: &HashMap<String, String>, key: &str, default: &str) -> String {
    params
        .get(key)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Collect `mask.1`, `mask.2`, ... in index order, stopping at the first
/// missing index.
pub fn decode_indexed_list(mask: &str, params: &HashMap<String, String>) -> Vec<String> {
    (1..)
        .map_while(|i| params.get(&format!("{mask}.{i}")).cloned())
        .collect()
}

/// Integer conversion of count parameters: optional leading whitespace and
/// sign, then as many decimal digits as present. No digits gives 0.
pub fn leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_indexed_list_stops_at_gap() {
        let p = params(&[("Group.2", "b"), ("Group.1", "a"), ("Group.4", "d")]);
        assert_eq!(decode_indexed_list("Group", &p), ["a", "b"]);
    }

    #[test]
    fn test_indexed_list_ignores_other_keys() {
        let p = params(&[
            ("SecurityGroup.1", "default"),
            ("SecurityGroupX.2", "nope"),
            ("SecurityGroup", "bare"),
            ("SecurityGroup.01", "padded"),
            ("Action", "RunInstances"),
            ("SecurityGroup.2", "web"),
        ]);
        assert_eq!(decode_indexed_list("SecurityGroup", &p), ["default", "web"]);
    }

    #[test]
    fn test_indexed_list_missing_first_index() {
        let p = params(&[("InstanceId.2", "i-2"), ("InstanceId.3", "i-3")]);
        assert!(decode_indexed_list("InstanceId", &p).is_empty());
        assert!(decode_indexed_list("InstanceId", &HashMap::new()).is_empty());
    }

    #[test]
    fn test_indexed_list_order_independent() {
        let forward = params(&[("Id.1", "x"), ("Id.2", "y"), ("Id.3", "z")]);
        let mut reversed = HashMap::new();
        for i in (1..=3).rev() {
            reversed.insert(format!("Id.{i}"), forward[&format!("Id.{i}")].clone());
        }
        assert_eq!(
            decode_indexed_list("Id", &forward),
            decode_indexed_list("Id", &reversed)
        );
    }

    #[test]
    fn test_scalar_default() {
        let p = Params::new(params(&[("KeyName", "demo"), ("UserData", "")]));
        assert_eq!(p.scalar("KeyName", "none"), "demo");
        assert_eq!(p.scalar("UserData", "none"), "");
        assert_eq!(p.scalar("ImageId", "wmi-default"), "wmi-default");
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("12"), 12);
        assert_eq!(leading_int("  7"), 7);
        assert_eq!(leading_int("12abc"), 12);
        assert_eq!(leading_int("abc"), 0);
        assert_eq!(leading_int(""), 0);
        assert_eq!(leading_int("-3"), -3);
        assert_eq!(leading_int("+4"), 4);
        assert_eq!(leading_int("1.9"), 1);
        assert_eq!(leading_int("99999999999999999999999"), i64::MAX);
    }
}
