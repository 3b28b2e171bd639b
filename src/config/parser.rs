//! Config string parser
//!
//! Grammar:
//!
//! ```text
//! list  := item ("," item)*
//! item  := key ("=" value)?
//! value := "(" list ")" | '"' chars '"' | token
//! ```
//!
//! A bare key is a flag. Whitespace around items and empty items are ignored.

use super::errors::{ConfigError, ConfigResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    /// Key given without `=value`
    Flag,
    Scalar(String),
    Nested(ConfigList),
}

impl ConfigValue {
    /// Human-readable form used in error messages.
    pub fn describe(&self) -> String {
        match self {
            ConfigValue::Flag => String::new(),
            ConfigValue::Scalar(s) => s.clone(),
            ConfigValue::Nested(_) => "(...)".to_string(),
        }
    }
}

/// An ordered list of parsed `key=value` items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigList {
    items: Vec<(String, ConfigValue)>,
}

impl ConfigList {
    /// Parses a comma-separated `key[=value]` list. Values may be nested
    /// `( … )` lists or quoted strings.
    pub fn parse(input: &str) -> ConfigResult<Self> {
        let mut parser = Parser {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        };
        parser.parse_list(false)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the last value given for `key`.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.items
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Fails on the first key not in `allowed`.
    pub fn check_keys(&self, call: &'static str, allowed: &[&str]) -> ConfigResult<()> {
        match self.items.iter().find(|(k, _)| !allowed.contains(&k.as_str())) {
            Some((key, _)) => Err(ConfigError::UnknownKey {
                call,
                key: key.clone(),
            }),
            None => Ok(()),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &'static str) -> ConfigError {
        ConfigError::Syntax {
            input: self.input.to_string(),
            position: self.pos,
            reason,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_list(&mut self, nested: bool) -> ConfigResult<ConfigList> {
        let mut list = ConfigList::default();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None if nested => return Err(self.error("unclosed '('")),
                None => return Ok(list),
                Some(b')') if nested => {
                    self.pos += 1;
                    return Ok(list);
                }
                Some(b')') => return Err(self.error("unexpected ')'")),
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }

            let key = self.parse_token();
            if key.is_empty() {
                return Err(self.error("expected a key"));
            }

            self.skip_whitespace();
            let value = if self.peek() == Some(b'=') {
                self.pos += 1;
                self.skip_whitespace();
                self.parse_value()?
            } else {
                ConfigValue::Flag
            };
            list.items.push((key, value));

            self.skip_whitespace();
            match self.peek() {
                None | Some(b')') => {}
                Some(b',') => self.pos += 1,
                Some(_) => return Err(self.error("expected ','")),
            }
        }
    }

    fn parse_value(&mut self) -> ConfigResult<ConfigValue> {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                Ok(ConfigValue::Nested(self.parse_list(true)?))
            }
            Some(b'"') => {
                self.pos += 1;
                let start = self.pos;
                while let Some(b) = self.peek() {
                    if b == b'"' {
                        let value = self.input[start..self.pos].to_string();
                        self.pos += 1;
                        return Ok(ConfigValue::Scalar(value));
                    }
                    self.pos += 1;
                }
                Err(self.error("unterminated string"))
            }
            _ => {
                let token = self.parse_token();
                if token.is_empty() {
                    Err(self.error("missing value"))
                } else {
                    Ok(ConfigValue::Scalar(token))
                }
            }
        }
    }

    fn parse_token(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || matches!(b, b',' | b'=' | b'(' | b')' | b'"') {
                break;
            }
            self.pos += 1;
        }
        self.input[start..self.pos].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(s: &str) -> ConfigValue {
        ConfigValue::Scalar(s.to_string())
    }

    #[test]
    fn test_empty_string_is_empty_list() {
        assert!(ConfigList::parse("").unwrap().is_empty());
        assert!(ConfigList::parse("  ").unwrap().is_empty());
    }

    #[test]
    fn test_key_value_pairs() {
        let list = ConfigList::parse("commit_timestamp=64, use_timestamp=false").unwrap();
        assert_eq!(list.get("commit_timestamp"), Some(&scalar("64")));
        assert_eq!(list.get("use_timestamp"), Some(&scalar("false")));
    }

    #[test]
    fn test_bare_key_is_flag() {
        let list = ConfigList::parse("create,log=(enabled)").unwrap();
        assert_eq!(list.get("create"), Some(&ConfigValue::Flag));
        match list.get("log") {
            Some(ConfigValue::Nested(inner)) => {
                assert_eq!(inner.get("enabled"), Some(&ConfigValue::Flag))
            }
            other => panic!("expected nested list, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_with_whitespace_and_quotes() {
        let list =
            ConfigList::parse("key_format=i,value_format=S, log=( enabled=false ),name=\"a b\"")
                .unwrap();
        assert_eq!(list.get("value_format"), Some(&scalar("S")));
        assert_eq!(list.get("name"), Some(&scalar("a b")));
        match list.get("log") {
            Some(ConfigValue::Nested(inner)) => {
                assert_eq!(inner.get("enabled"), Some(&scalar("false")))
            }
            other => panic!("expected nested list, got {:?}", other),
        }
    }

    #[test]
    fn test_last_value_wins() {
        let list = ConfigList::parse("sync=off,sync=on").unwrap();
        assert_eq!(list.get("sync"), Some(&scalar("on")));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(ConfigList::parse("log=(enabled").is_err());
        assert!(ConfigList::parse("a=1)").is_err());
        assert!(ConfigList::parse("a=").is_err());
        assert!(ConfigList::parse("=1").is_err());
        assert!(ConfigList::parse("a b").is_err());
        assert!(ConfigList::parse("a=\"open").is_err());
    }

    #[test]
    fn test_check_keys_rejects_unknown() {
        let list = ConfigList::parse("read_timestamp=1,bogus=2").unwrap();
        let err = list.check_keys("begin_transaction", &["read_timestamp"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { ref key, .. } if key == "bogus"));
    }
}
