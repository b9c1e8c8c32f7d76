use anyhow::Result;

/// Platform side of rest alerts: local notifications and haptics.
///
/// Every call is fire-and-forget from the engine's point of view; errors
/// are logged and dropped by the coordinator. `cancel` must accept ids that
/// already fired or were already cancelled.
pub trait PlatformNotifier: Send + Sync {
    fn schedule(&self, title: &str, body: &str, delay_seconds: u32) -> Result<String>;

    fn cancel(&self, id: &str) -> Result<()>;

    fn present(&self, title: &str, body: &str) -> Result<()>;

    fn haptic(&self);
}

/// Notifier for hosts without notification support.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl PlatformNotifier for SilentNotifier {
    fn schedule(&self, _title: &str, _body: &str, _delay_seconds: u32) -> Result<String> {
        Ok(String::new())
    }

    fn cancel(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    fn present(&self, _title: &str, _body: &str) -> Result<()> {
        Ok(())
    }

    fn haptic(&self) {}
}
