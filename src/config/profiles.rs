use crate::core::template::template;
use crate::core::{Accessor, DerivationRegistry, Setting, Settings};
use crate::theming::project_root_name;
use crate::utils::error::Result;
use serde_json::json;
use std::path::Path;

/// 疊加在設定檔之上的具名覆寫
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Profile {
    #[default]
    Default,
    /// 產生驗收測試用靜態資源的設定
    StaticOptimized,
}

impl Profile {
    pub fn apply(&self, settings: &mut Settings, registry: &mut DerivationRegistry) -> Result<()> {
        match self {
            Profile::Default => Ok(()),
            Profile::StaticOptimized => apply_static_optimized(settings, registry),
        }
    }
}

fn apply_static_optimized(settings: &mut Settings, registry: &mut DerivationRegistry) -> Result<()> {
    tracing::debug!("Applying static-optimized profile");

    // 僅用於收集靜態資源
    settings.set(
        "DATABASES",
        json!({
            "default": {
                "ENGINE": "django.db.backends.sqlite3",
                "ATOMIC_REQUESTS": true
            }
        }),
    );

    settings.set(
        "STATICFILES_STORAGE",
        "openedx.core.lib.django_require.staticstorage.OptimizedCachedRequireJsStorage",
    );
    settings.set(
        "STATICFILES_FINDERS",
        json!([
            "django.contrib.staticfiles.finders.FileSystemFinder",
            "django.contrib.staticfiles.finders.AppDirectoriesFinder",
            "openedx.core.lib.xblock_pipeline.finder.XBlockPipelineFinder"
        ]),
    );

    settings.set("TEST_ROOT", template("{REPO_ROOT}/test_root"));
    settings.set("LOG_DIR", template("{TEST_ROOT}/log"));
    settings.set(
        "STATIC_ROOT",
        Setting::derived(|s| {
            let test_root = s.require_str("TEST_ROOT")?;
            let project = s
                .str("PROJECT_ROOT")
                .and_then(|root| project_root_name(Path::new(root)))
                .unwrap_or_else(|| "cms".to_string());
            let static_root = Path::new(test_root).join("staticfiles").join(project);
            Ok(json!(static_root.to_string_lossy()))
        }),
    );
    settings.set_path(
        &["WEBPACK_LOADER", "DEFAULT", "STATS_FILE"],
        template("{STATIC_ROOT}/webpack-stats.json"),
    )?;

    // uglify 是資源建置中最慢的步驟
    settings.set("REQUIRE_BUILD_PROFILE_OPTIMIZE", "none");

    registry.register(["TEST_ROOT", "LOG_DIR", "STATIC_ROOT"]);
    registry.register([Accessor::nested(&["WEBPACK_LOADER", "DEFAULT", "STATS_FILE"])]);
    Ok(())
}
