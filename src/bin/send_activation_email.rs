use clap::Parser;
use lms_settings::adapters::LogMailer;
use lms_settings::app::tasks::{send_activation_email, ActivationOutcome};
use lms_settings::domain::model::ActivationEmail;
use lms_settings::utils::{logger, validation::Validate};
use lms_settings::SettingsFile;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "send-activation-email")]
#[command(about = "Send an account activation email using the [email] retry settings")]
struct Args {
    /// Path to the settings TOML file
    #[arg(short, long, default_value = "lms-settings.toml")]
    settings: PathBuf,

    #[arg(long)]
    to: String,

    #[arg(long)]
    from: String,

    #[arg(long, default_value = "Activate your account")]
    subject: String,

    #[arg(long)]
    message: String,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let file = SettingsFile::from_file(&args.settings)?;
    file.validate()?;
    let policy = file.email().retry_policy()?;

    let email = ActivationEmail {
        subject: args.subject,
        message: args.message,
        from_address: args.from,
        dest_addr: args.to,
    };

    // 目前僅提供寫入日誌的寄送方式
    match send_activation_email(&LogMailer, policy, &email).await? {
        ActivationOutcome::Sent => println!("✅ Activation email sent to {}", email.dest_addr),
        ActivationOutcome::GaveUp => {
            println!("❌ Gave up sending activation email to {}", email.dest_addr)
        }
    }

    Ok(())
}
