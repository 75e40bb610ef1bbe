use core::fmt;

/// Identifier of a sub-basin in a drainage network.
///
/// Ids are kept as text so that both integer ids (`"1"`, `"42"`) and
/// alphanumeric ids (`"A"`, `"sb_07"`) from topology files are representable.
/// Integer constructors store the decimal text.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(String);

impl NodeId {
    /// Create an id from its text, rejecting empty or padded text.
    pub fn parse(text: &str) -> crate::CoreResult<Self> {
        if text.is_empty() {
            return Err(crate::CoreError::InvalidId { what: "empty id" });
        }
        if text.trim() != text {
            return Err(crate::CoreError::InvalidId {
                what: "id has surrounding whitespace",
            });
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

macro_rules! node_id_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for NodeId {
                fn from(v: $t) -> Self {
                    Self(v.to_string())
                }
            }
        )*
    };
}

node_id_from_int!(u8, u16, u32, u64, usize, i32, i64);

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ids_use_decimal_text() {
        assert_eq!(NodeId::from(42_u32), NodeId::from("42"));
        assert_eq!(NodeId::from(-3_i64).as_str(), "-3");
    }

    #[test]
    fn parse_rejects_blank_and_padded() {
        assert!(NodeId::parse("").is_err());
        assert!(NodeId::parse(" 7").is_err());
        assert_eq!(NodeId::parse("sb_7").unwrap().to_string(), "sb_7");
    }
}
