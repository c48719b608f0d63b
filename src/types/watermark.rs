use serde::{Deserialize, Serialize};

/// Origin stamp attached to platform-issued user data such as phone numbers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Watermark {
    /// Unix seconds at which the platform issued the data
    pub timestamp: i64,
    /// Mini Program the data was issued for
    pub appid: String,
}

impl Watermark {
    /// Whether the data was issued for `appid`.
    pub fn is_for(&self, appid: &str) -> bool {
        self.appid == appid
    }
}
