use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use client_logging::{client_debug, client_info};
use emotrack_client::{
    ApiClient, ClientSettings, JobPoller, Navigator, RonFileStore, Route, RouteTracker,
    SupportInsightsQuery,
};
use emotrack_core::{ChatUpload, JobPhase};
use serde_json::Value;

use crate::cli::{Cli, Command, Dataset};
use crate::render;

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let global = cli.global;
    let settings = ClientSettings {
        base_url: global.api_url,
        poll_interval: Duration::from_millis(global.poll_interval_ms.max(1)),
        ..ClientSettings::default()
    };
    let state_dir = resolve_state_dir(global.state_dir)?;
    client_debug!("Using state directory {:?}", state_dir);

    let navigator = Arc::new(RouteTracker::new(start_route(&cli.command)));
    let client = ApiClient::connect(
        &settings,
        Arc::new(RonFileStore::new(state_dir)),
        navigator.clone(),
    )
    .context("invalid API settings")?;
    client.session().restore();

    let code = dispatch(&client, &settings, cli.command).await;

    if navigator.login_redirects() > 0 && navigator.current_route() == Route::Login {
        eprintln!("Your session has expired. Run `emotrack login` to sign in again.");
    }
    code
}

async fn dispatch(
    client: &ApiClient,
    settings: &ClientSettings,
    command: Command,
) -> Result<ExitCode> {
    let session = client.session();
    match command {
        Command::Login { email, password } => {
            session.login(&email, &password).await?;
            println!("{}", render::session_line(&session.view()));
        }
        Command::Signup {
            email,
            password,
            login,
        } => {
            session.signup(&email, &password).await?;
            println!("Account created for {}.", email.trim());
            if login {
                session.login(&email, &password).await?;
                println!("{}", render::session_line(&session.view()));
            } else {
                println!("Run `emotrack login` to sign in.");
            }
        }
        Command::Google { token } => {
            if !session.federated_login(&token).await {
                eprintln!("Google sign-in failed. Please try again.");
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", render::session_line(&session.view()));
        }
        Command::Logout => {
            session.logout();
            println!("Signed out.");
        }
        Command::Whoami => {
            println!("{}", render::session_line(&session.view()));
        }
        Command::ForgotPassword { email } => {
            let message = session.forgot_password(&email).await?;
            println!("{}", non_empty(message, "Reset code requested."));
        }
        Command::ResetPassword {
            token,
            new_password,
        } => {
            let message = session.reset_password(&token, &new_password).await?;
            println!("{}", non_empty(message, "Password updated."));
        }
        Command::Analyze { file } => return analyze(client, settings, &file).await,
        Command::Predict { text } => print_json(&client.predict(&text).await?)?,
        Command::Fetch {
            dataset,
            range,
            days,
        } => {
            let value = fetch(client, dataset, &range, days).await?;
            print_json(&value)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn analyze(client: &ApiClient, settings: &ClientSettings, file: &Path) -> Result<ExitCode> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("could not read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.zip".to_string());
    client_info!("Analyzing {} ({} bytes)", file_name, bytes.len());

    let mut poller = JobPoller::new(Arc::new(client.clone()), settings.poll_interval);
    let mut updates = poller.subscribe();
    poller.choose_file(ChatUpload::new(file_name, bytes));
    if !poller.submit() {
        return Err(anyhow!("analysis could not be started"));
    }

    let mut last_line = String::new();
    loop {
        let state = updates.borrow_and_update().clone();
        let line = render::job_line(&state.view());
        if line != last_line {
            println!("{line}");
            last_line = line;
        }
        if state.phase().is_terminal() {
            break;
        }
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                poller.teardown();
                eprintln!("Cancelled.");
                return Ok(ExitCode::from(130));
            }
        }
    }

    let state = poller.state();
    match (state.phase(), state.result()) {
        (JobPhase::Completed, Some(result)) => {
            print!("{}", render::analysis_report(result));
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::FAILURE),
    }
}

async fn fetch(client: &ApiClient, dataset: Dataset, range: &str, days: u32) -> Result<Value> {
    let value = match dataset {
        Dataset::Timeline => client.timeline(range).await?,
        Dataset::Distribution => client.distribution().await?,
        Dataset::Drift => client.drift().await?,
        Dataset::Alerts => client.alerts().await?,
        Dataset::Compare => client.compare(range).await?,
        Dataset::SelfHistory => client.self_emotion_history(range).await?,
        Dataset::SelfDistribution => client.self_emotion_distribution(range).await?,
        Dataset::Fusion => client.fusion(days).await?,
        Dataset::SupportInsights => {
            let query = SupportInsightsQuery {
                days,
                ..SupportInsightsQuery::default()
            };
            client.support_insights(&query).await?
        }
    };
    Ok(value)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

fn start_route(command: &Command) -> Route {
    match command {
        Command::Login { .. }
        | Command::Signup { .. }
        | Command::Google { .. }
        | Command::ForgotPassword { .. }
        | Command::ResetPassword { .. } => Route::Login,
        Command::Analyze { .. } => Route::ChatAnalyzer,
        Command::Fetch {
            dataset: Dataset::SelfHistory | Dataset::SelfDistribution,
            ..
        } => Route::SelfMonitor,
        Command::Fetch {
            dataset: Dataset::SupportInsights,
            ..
        } => Route::Support,
        Command::Logout | Command::Whoami | Command::Predict { .. } | Command::Fetch { .. } => {
            Route::Dashboard
        }
    }
}

fn resolve_state_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(|| dirs::config_dir().map(|dir| dir.join("emotrack")))
        .context("no configuration directory available; pass --state-dir")
}
