use crate::core::apps::{default_apps, AppConfig};
use crate::core::derived::DerivationRegistry;
use crate::domain::settings::Settings;
use crate::utils::error::Result;

/// 完成設定物件：先處理衍生設定，再執行各應用程式的 ready hook
pub struct Bootstrap {
    registry: DerivationRegistry,
    apps: Vec<Box<dyn AppConfig>>,
}

impl Bootstrap {
    pub fn new(registry: DerivationRegistry) -> Self {
        Self {
            registry,
            apps: Vec::new(),
        }
    }

    pub fn with_default_apps(registry: DerivationRegistry) -> Self {
        Self {
            registry,
            apps: default_apps(),
        }
    }

    pub fn with_app(mut self, app: Box<dyn AppConfig>) -> Self {
        self.apps.push(app);
        self
    }

    pub fn registry(&self) -> &DerivationRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DerivationRegistry {
        &mut self.registry
    }

    pub fn finalize(&self, settings: &mut Settings) -> Result<()> {
        tracing::info!(
            "Finalizing {} settings ({} derived, {} apps)",
            settings.len(),
            self.registry.len(),
            self.apps.len()
        );

        self.registry.apply(settings);

        for app in &self.apps {
            tracing::debug!("Running ready hook for {} ({})", app.verbose_name(), app.name());
            app.ready(settings)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::Setting;
    use crate::utils::error::SettingsError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct RecordingApp {
        seen: Arc<AtomicUsize>,
    }

    impl AppConfig for RecordingApp {
        fn name(&self) -> &str {
            "recording"
        }

        fn verbose_name(&self) -> &str {
            "Recording"
        }

        fn ready(&self, settings: &mut Settings) -> Result<()> {
            // 此時衍生值必須已是具體值
            if settings.str("DERIVED").is_some() {
                self.seen.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    struct FailingApp;

    impl AppConfig for FailingApp {
        fn name(&self) -> &str {
            "failing"
        }

        fn verbose_name(&self) -> &str {
            "Failing"
        }

        fn ready(&self, _settings: &mut Settings) -> Result<()> {
            Err(SettingsError::ConfigError {
                message: "not ready".to_string(),
            })
        }
    }

    #[test]
    fn test_ready_hooks_run_after_derivation() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut registry = DerivationRegistry::new();
        registry.register(["DERIVED"]);
        let bootstrap = Bootstrap::new(registry).with_app(Box::new(RecordingApp {
            seen: seen.clone(),
        }));

        let mut settings = Settings::new();
        settings.set("DERIVED", Setting::derived(|_| Ok(json!("done"))));
        bootstrap.finalize(&mut settings).unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_ready_hook_is_reported() {
        let bootstrap = Bootstrap::new(DerivationRegistry::new()).with_app(Box::new(FailingApp));

        let mut settings = Settings::new();
        assert!(bootstrap.finalize(&mut settings).is_err());
    }
}
