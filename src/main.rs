//! Coursedesk - a terminal client for Moodle course data.
//!
//! This binary is the composition root: it builds the API client, the
//! auth repository, and the course repository in dependency order, and
//! maps CLI commands onto them. Retry policy lives here too - a single
//! re-login from stored credentials when the backend rejects the
//! session - the repositories themselves never retry.

use std::future::Future;
use std::io::{self, Write};

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coursedesk::api::{ApiError, MoodleClient};
use coursedesk::auth::{AuthRepository, CredentialStore, Credentials, SessionStore};
use coursedesk::cache::CacheManager;
use coursedesk::config::Config;
use coursedesk::courses::repository::DEFAULT_DEADLINE_LIMIT;
use coursedesk::courses::CourseRepository;
use coursedesk::utils::truncate_string;

// ============================================================================
// Constants
// ============================================================================

/// Maximum concurrent schedule fetches during a full refresh.
/// Keeps parallel requests modest to avoid hammering the backend.
const MAX_CONCURRENT_REQUESTS: usize = 4;

/// Column width for course descriptions in list output.
const DESCRIPTION_WIDTH: usize = 60;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// The constructed object graph: repositories built in dependency
/// order from the loaded configuration.
struct AppContext {
    config: Config,
    auth: AuthRepository,
    courses: CourseRepository,
    credentials: CredentialStore,
}

/// Plain topological construction: Config -> client -> AuthRepository
/// -> CourseRepository. A persisted session is restored when present.
async fn build_context(config: Config) -> Result<AppContext> {
    let base_url = config.resolved_base_url()?;
    let cache_dir = config.cache_dir()?;
    let credentials = CredentialStore::for_host(&config.backend_host()?);

    let api = MoodleClient::new(&base_url)?;
    let store = SessionStore::new(cache_dir.clone());
    let auth = AuthRepository::new(api.clone(), store);
    auth.restore().await;

    let cache = CacheManager::new(cache_dir)?;
    let courses = CourseRepository::new(api, auth.clone(), cache);

    Ok(AppContext {
        config,
        auth,
        courses,
        credentials,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    match command {
        "login" => cmd_login(&args[2..]).await,
        "logout" => cmd_logout(args.iter().any(|a| a == "--forget")).await,
        "profile" => cmd_profile(args.iter().any(|a| a == "--refresh")).await,
        "courses" => cmd_courses().await,
        "schedule" => {
            let course_id = args
                .get(2)
                .context("Usage: coursedesk schedule <course-id>")?
                .parse::<i64>()
                .context("course id must be a number")?;
            cmd_schedule(course_id).await
        }
        "deadlines" => {
            let limit = match args.get(2) {
                Some(value) => value.parse::<u32>().context("limit must be a number")?,
                None => DEFAULT_DEADLINE_LIMIT,
            };
            cmd_deadlines(limit).await
        }
        "home" => cmd_home().await,
        "refresh" => cmd_refresh().await,
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}\n", other);
            print_usage();
            std::process::exit(2);
        }
    }
}

fn print_usage() {
    println!("coursedesk - Moodle courses from the command line\n");
    println!("Usage: coursedesk <command>\n");
    println!("Commands:");
    println!("  login [username] [--url <site-url>]   Log in and store the session");
    println!("  logout [--forget]                     Clear the session (--forget drops stored credentials)");
    println!("  home                                  Profile, urgent alerts, and upcoming deadlines");
    println!("  courses                               List enrolled courses");
    println!("  schedule <course-id>                  Activity schedule for a course");
    println!("  deadlines [limit]                     Upcoming deadlines (default {})", DEFAULT_DEADLINE_LIMIT);
    println!("  profile [--refresh]                   Show the logged-in user");
    println!("  refresh                               Prefetch courses, schedules, and deadlines");
}

// ============================================================================
// Session policy
// ============================================================================

/// Re-authenticate from stored credentials. This is the whole CLI
/// retry policy; the repositories never retry on their own.
async fn relogin(ctx: &AppContext) -> Result<(), ApiError> {
    let Some(username) = ctx.config.last_username.clone() else {
        return Err(ApiError::Unauthenticated);
    };
    let Ok(password) = ctx.credentials.get_password(&username) else {
        return Err(ApiError::Unauthenticated);
    };

    info!(user = %username, "Re-authenticating with stored credentials");
    ctx.auth.login(&Credentials { username, password }).await?;
    Ok(())
}

async fn ensure_session(ctx: &AppContext) -> Result<(), ApiError> {
    if ctx.auth.is_authenticated().await {
        Ok(())
    } else {
        relogin(ctx).await
    }
}

/// Pre-flight session check with a friendly message when the user has
/// simply never logged in. Other failures (e.g. transport) pass
/// through untouched.
async fn require_session(ctx: &AppContext) -> Result<()> {
    ensure_session(ctx).await.map_err(|e| match e {
        ApiError::Unauthenticated => not_logged_in(),
        other => other.into(),
    })
}

/// Run an operation, re-logging in once if the backend rejected the
/// session mid-flight.
async fn with_relogin<T, Fut>(
    ctx: &AppContext,
    op: impl Fn() -> Fut,
) -> Result<T, ApiError>
where
    Fut: Future<Output = Result<T, ApiError>>,
{
    match op().await {
        Err(ApiError::Unauthenticated) => {
            relogin(ctx).await?;
            op().await
        }
        other => other,
    }
}

fn not_logged_in() -> anyhow::Error {
    anyhow::anyhow!("Not logged in. Run: coursedesk login")
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_login(args: &[String]) -> Result<()> {
    let mut config = Config::load()?;

    let mut username_arg: Option<String> = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--url" => {
                let url = iter.next().context("--url requires a value")?;
                config.base_url = Some(url.trim_end_matches('/').to_string());
            }
            other if !other.starts_with('-') => username_arg = Some(other.to_string()),
            other => anyhow::bail!("Unknown flag: {}", other),
        }
    }

    let ctx = build_context(config.clone()).await?;

    let username = match username_arg {
        Some(username) => username,
        None => prompt_username(config.last_username.as_deref())?,
    };

    let password = if ctx.credentials.has_credentials(&username) {
        print!("Use stored password? [Y/n]: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if input.trim().to_lowercase() != "n" {
            ctx.credentials.get_password(&username)?
        } else {
            rpassword::prompt_password("Password: ")?
        }
    } else {
        rpassword::prompt_password("Password: ")?
    };

    println!("\nAuthenticating...");

    let session = ctx
        .auth
        .login(&Credentials {
            username: username.clone(),
            password: password.clone(),
        })
        .await?;

    if let Err(e) = ctx.credentials.store(&username, &password) {
        warn!(error = %e, "Failed to store credentials");
    }

    config.last_username = Some(username);
    config.site_name = session.site_name.clone();
    config.save()?;

    match &session.site_name {
        Some(site) => println!("Logged in to {} as {}", site, session.full_name),
        None => println!("Logged in as {}", session.full_name),
    }
    Ok(())
}

fn prompt_username(last_username: Option<&str>) -> Result<String> {
    match last_username {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        last_username
            .map(str::to_string)
            .context("Username required")
    } else {
        Ok(input.to_string())
    }
}

async fn cmd_logout(forget: bool) -> Result<()> {
    let config = Config::load()?;
    let ctx = build_context(config.clone()).await?;

    ctx.auth.invalidate_session().await;

    if forget {
        if let Some(ref username) = config.last_username {
            if let Err(e) = ctx.credentials.delete(username) {
                warn!(error = %e, "Failed to delete stored credentials");
            }
        }
    }

    println!("Logged out.");
    Ok(())
}

async fn cmd_profile(refresh: bool) -> Result<()> {
    let ctx = build_context(Config::load()?).await?;
    require_session(&ctx).await?;

    let profile = if refresh {
        with_relogin(&ctx, || ctx.auth.refresh_profile()).await?
    } else {
        ctx.auth.user_profile().await.ok_or_else(not_logged_in)?
    };

    println!("{} ({})", profile.full_name, profile.username);
    if let Some(ref site) = ctx.config.site_name {
        println!("Site: {}", site);
    }
    if let Some(session) = ctx.auth.current_session().await {
        println!("Session since: {}", session.issued_at.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}

async fn cmd_courses() -> Result<()> {
    let ctx = build_context(Config::load()?).await?;
    require_session(&ctx).await?;

    let courses = match with_relogin(&ctx, || ctx.courses.list_courses()).await {
        Ok(courses) => courses,
        Err(ApiError::Unauthenticated) => return Err(not_logged_in()),
        Err(err @ ApiError::Network(_)) => match ctx.courses.cached_courses() {
            Some(cached) => {
                eprintln!("Offline - showing courses from {}", cached.age_display());
                cached.data
            }
            None => return Err(err.into()),
        },
        Err(err) => return Err(err.into()),
    };

    if courses.is_empty() {
        println!("No enrolled courses.");
        return Ok(());
    }

    println!("{:<8} {:<10} {:<6} Course", "ID", "Short", "Done");
    for course in &courses {
        let marker = if course.favourite { "*" } else { " " };
        println!(
            "{:<8} {:<10} {:<6}{}{}",
            course.id,
            course.short_name,
            course.progress_display(),
            marker,
            course.name
        );
        if !course.description.is_empty() {
            println!("         {}", truncate_string(&course.description, DESCRIPTION_WIDTH));
        }
    }
    Ok(())
}

async fn cmd_schedule(course_id: i64) -> Result<()> {
    let ctx = build_context(Config::load()?).await?;
    require_session(&ctx).await?;

    let entries = match with_relogin(&ctx, || ctx.courses.get_schedule(course_id)).await {
        Ok(entries) => entries,
        Err(ApiError::Unauthenticated) => return Err(not_logged_in()),
        Err(ApiError::NotFound(_)) => anyhow::bail!("Course {} not found", course_id),
        Err(err @ ApiError::Network(_)) => match ctx.courses.cached_schedule(course_id) {
            Some(cached) => {
                eprintln!("Offline - showing schedule from {}", cached.age_display());
                cached.data
            }
            None => return Err(err.into()),
        },
        Err(err) => return Err(err.into()),
    };

    if entries.is_empty() {
        println!("No activities in course {}.", course_id);
        return Ok(());
    }

    let mut current_section = String::new();
    for entry in &entries {
        if entry.section != current_section {
            println!("\n== {} ==", entry.section);
            current_section = entry.section.clone();
        }
        let hidden = if entry.visible { "" } else { " (hidden)" };
        println!("  [{}] {}{}", entry.kind.display_name(), entry.title, hidden);
    }
    Ok(())
}

async fn cmd_deadlines(limit: u32) -> Result<()> {
    let ctx = build_context(Config::load()?).await?;
    require_session(&ctx).await?;

    let deadlines = match with_relogin(&ctx, || ctx.courses.upcoming_deadlines(limit)).await {
        Ok(deadlines) => deadlines,
        Err(ApiError::Unauthenticated) => return Err(not_logged_in()),
        Err(err @ ApiError::Network(_)) => match ctx.courses.cached_deadlines() {
            Some(cached) => {
                eprintln!("Offline - showing deadlines from {}", cached.age_display());
                cached.data
            }
            None => return Err(err.into()),
        },
        Err(err) => return Err(err.into()),
    };

    if deadlines.is_empty() {
        println!("No upcoming deadlines.");
        return Ok(());
    }

    for deadline in &deadlines {
        let urgent = if deadline.urgent { " !" } else { "" };
        println!(
            "{:<8} {:<10} [{}] {}{}",
            deadline.time_remaining(),
            deadline.course_name,
            deadline.kind.display_name(),
            deadline.title,
            urgent
        );
    }
    Ok(())
}

/// The home view: who is logged in, what is closing soon, and what is
/// due over the next month.
async fn cmd_home() -> Result<()> {
    let ctx = build_context(Config::load()?).await?;
    require_session(&ctx).await?;

    if let Some(profile) = ctx.auth.user_profile().await {
        match &ctx.config.site_name {
            Some(site) => println!("{} - {}\n", profile.full_name, site),
            None => println!("{}\n", profile.full_name),
        }
    }

    match with_relogin(&ctx, || ctx.courses.urgent_alerts()).await {
        Ok(alerts) if !alerts.is_empty() => {
            println!("Closing soon:");
            for alert in &alerts {
                println!(
                    "  ! {} ({}) - {} left",
                    alert.title,
                    alert.course_name,
                    alert.time_remaining()
                );
            }
            println!();
        }
        Ok(_) => {}
        Err(ApiError::Unauthenticated) => return Err(not_logged_in()),
        Err(ApiError::Network(_)) => {
            if let Some(cached) = ctx.courses.cached_deadlines() {
                eprintln!("Offline - showing deadlines from {}", cached.age_display());
                for deadline in cached.data.iter().take(DEFAULT_DEADLINE_LIMIT as usize) {
                    println!(
                        "{:<8} {:<10} {}",
                        deadline.time_remaining(),
                        deadline.course_name,
                        deadline.title
                    );
                }
                return Ok(());
            }
            anyhow::bail!("Unable to reach the server and no cached data is available");
        }
        Err(err) => return Err(err.into()),
    }

    let deadlines = with_relogin(&ctx, || ctx.courses.upcoming_deadlines(DEFAULT_DEADLINE_LIMIT))
        .await
        .map_err(anyhow::Error::from)?;

    if deadlines.is_empty() {
        println!("Nothing due in the next month.");
    } else {
        println!("Upcoming:");
        for deadline in &deadlines {
            println!(
                "  {:<8} {:<10} {}",
                deadline.time_remaining(),
                deadline.course_name,
                deadline.title
            );
        }
    }
    Ok(())
}

/// Prefetch everything: course list, per-course schedules (bounded
/// concurrency), deadlines, and the user profile.
async fn cmd_refresh() -> Result<()> {
    let ctx = build_context(Config::load()?).await?;
    require_session(&ctx).await?;

    let courses = with_relogin(&ctx, || ctx.courses.list_courses()).await?;
    println!("Fetched {} courses", courses.len());

    let results: Vec<(i64, Result<usize, ApiError>)> = stream::iter(courses.iter().map(|course| {
        let repo = ctx.courses.clone();
        let course_id = course.id;
        async move {
            let result = repo.get_schedule(course_id).await.map(|entries| entries.len());
            (course_id, result)
        }
    }))
    .buffer_unordered(MAX_CONCURRENT_REQUESTS)
    .collect()
    .await;

    for (course_id, result) in &results {
        match result {
            Ok(count) => println!("  course {}: {} activities", course_id, count),
            Err(e) => warn!(course_id, error = %e, "Failed to fetch schedule"),
        }
    }

    let deadlines = ctx.courses.upcoming_deadlines(DEFAULT_DEADLINE_LIMIT).await?;
    println!("Fetched {} deadlines", deadlines.len());

    ctx.auth.refresh_profile().await?;
    println!("Profile refreshed");
    Ok(())
}
