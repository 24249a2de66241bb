use clap::Parser;
use lms_settings::adapters::{HttpSailthruClient, SwitchSet};
use lms_settings::app::tasks::{EnrollmentSync, SAILTHRU_SWITCH_NAMESPACE};
use lms_settings::domain::model::EnrollStatusChange;
use lms_settings::utils::{logger, validation::Validate};
use lms_settings::{Profile, SettingsFile};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sailthru-enroll")]
#[command(about = "Push a course enrollment change to Sailthru")]
struct Args {
    /// Path to the settings TOML file
    #[arg(short, long, default_value = "lms-settings.toml")]
    settings: PathBuf,

    #[arg(long)]
    email: String,

    #[arg(long)]
    course: String,

    #[arg(long, default_value = "audit")]
    mode: String,

    /// Ignore the audit purchase switch and always run the update
    #[arg(long)]
    force: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let file = SettingsFile::from_file(&args.settings)?;
    file.validate()?;

    let marketing = file.marketing();
    if !marketing.enabled {
        tracing::warn!("Sailthru integration is disabled in {}", args.settings.display());
        return Ok(());
    }

    let (mut settings, bootstrap) = file.bootstrap(Profile::Default)?;
    bootstrap.finalize(&mut settings)?;

    let client = HttpSailthruClient::from_config(&marketing)?;
    let mut switches = SwitchSet::from_namespace(SAILTHRU_SWITCH_NAMESPACE, &marketing.switches);
    let sync = Arc::new(EnrollmentSync::from_settings(client, marketing, &settings)?);

    let change = EnrollStatusChange {
        email: args.email,
        course_id: args.course,
        mode: args.mode,
    };

    if args.force {
        switches.enable(format!(
            "{}.{}",
            SAILTHRU_SWITCH_NAMESPACE,
            lms_settings::app::tasks::SAILTHRU_AUDIT_PURCHASE_ENABLED
        ));
    }

    if let Some(handle) = sync.update_sailthru(&switches, &change) {
        handle.await??;
        println!("✅ Sailthru updated for {} in {}", change.email, change.course_id);
    } else {
        println!(
            "⏭️  Skipped: switch disabled or '{}' mode is not tracked",
            change.mode
        );
    }

    Ok(())
}
