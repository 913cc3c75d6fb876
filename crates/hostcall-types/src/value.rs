use serde::{Deserialize, Serialize};
use std::fmt;
use std::string::FromUtf8Error;

/// 宿主侧拥有的字符串值
///
/// 长度随值一起携带，不依赖 NUL 结尾，因此可以包含 `\0`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostValue(String);

impl HostValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 从客户端拷贝出来的字节构造，要求合法 UTF-8
    pub fn from_utf8(bytes: Vec<u8>) -> Result<Self, FromUtf8Error> {
        String::from_utf8(bytes).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for HostValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
