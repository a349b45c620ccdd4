//! QR payload generation for the device-switch flow.
//!
//! The core never renders QR images; it only produces the payload string
//! the frontend encodes into an image. Implementations that need the
//! animated (rolling) payload can plug in here without touching the
//! orchestrator.

use std::time::Duration;

/// QR material held by an active session.
#[derive(Debug, Clone, Copy)]
pub struct QrData<'a> {
    pub auto_start_token: &'a str,
    pub qr_start_token: &'a str,
    pub qr_start_secret: &'a str,
    /// Time since the order was created, for rolling payloads.
    pub elapsed: Duration,
}

/// Produces the QR payload string for a pending order.
pub trait QrGenerator: Send + Sync {
    fn generate(&self, data: &QrData<'_>) -> String;
}

/// Generator for the static start-token payload.
///
/// Encodes the app-launch link with the order's auto-start token. The
/// rolling-code scheme is a drop-in replacement behind the same trait.
#[derive(Debug, Clone, Default)]
pub struct StartTokenQrGenerator;

impl QrGenerator for StartTokenQrGenerator {
    fn generate(&self, data: &QrData<'_>) -> String {
        format!(
            "bankid:///?autostarttoken={}&redirect=null",
            data.auto_start_token
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_token_payload() {
        let generator = StartTokenQrGenerator;
        let payload = generator.generate(&QrData {
            auto_start_token: "7c40b5c9-fa74-49cf-b98c-bfe651f9a7c6",
            qr_start_token: "unused",
            qr_start_secret: "unused",
            elapsed: Duration::from_secs(3),
        });
        assert_eq!(
            payload,
            "bankid:///?autostarttoken=7c40b5c9-fa74-49cf-b98c-bfe651f9a7c6&redirect=null"
        );
    }
}
