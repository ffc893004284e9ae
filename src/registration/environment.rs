use async_trait::async_trait;

/// Source of the `development` flag sent with every registration.
///
/// A failure is not fatal: the delivery logs it and sends `development: false`.
#[async_trait]
pub trait Environment: Send + Sync + 'static {
    async fn is_development(&self) -> anyhow::Result<bool>;
}

/// Fixed answer, decided when the process starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StaticEnvironment {
    development: bool,
}

impl StaticEnvironment {
    pub fn new(development: bool) -> Self {
        Self { development }
    }

    pub fn production() -> Self {
        Self::new(false)
    }

    pub fn development() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Environment for StaticEnvironment {
    async fn is_development(&self) -> anyhow::Result<bool> {
        Ok(self.development)
    }
}
