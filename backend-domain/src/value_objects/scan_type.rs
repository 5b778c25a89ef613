// Scan channel value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanType {
    #[serde(rename = "QR")]
    Qr,
    #[serde(rename = "NFC")]
    Nfc,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Qr => "QR",
            ScanType::Nfc => "NFC",
        }
    }
}
