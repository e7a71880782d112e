use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use cabinet::api::types::GameEntry;
use cabinet::auth::{self, Credentials};
use cabinet::catalog::{filter_and_sort, CatalogFilter, CatalogSort};
use cabinet::config::{AppConfig, DEFAULT_CONFIG_FILE};
use cabinet::session::{render_roster, roster_header, Session};
use cabinet::upload::{QueueEvent, UploadQueue, UploadSpec};
use cabinet::utils::format_bytes;
use cabinet::ApiClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cabinet=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::load(DEFAULT_CONFIG_FILE).context("Failed to load config")?;
    let client = ApiClient::from_config(&config).context("Failed to create API client")?;

    println!("Cabinet v{} ({})", env!("CARGO_PKG_VERSION"), config.base_url);
    println!("Theme: {}", config.theme);

    // 配置里有上次的用户名就直接恢复会话，跟原来的登录态持久化一致
    let username = match config.last_username.clone() {
        Some(username) => {
            println!("Welcome back, {}", username);
            username
        }
        None => login_gate(&client, &mut config).await?,
    };
    let session = Session::start(Arc::new(client.clone()), &username);

    let emulators = client
        .emulators()
        .await
        .context("Failed to fetch emulators")?;
    let names: Vec<&str> = emulators.iter().map(|emulator| emulator.name.as_str()).collect();
    println!("Emulators: {}", names.join(", "));

    let entries = client.games().await.context("Failed to fetch games")?;
    let filter = CatalogFilter::default();
    let sort = CatalogSort::default();
    print_catalog(&entries, &filter, sort);

    let handle = UploadQueue::new(client.clone());
    let printer_handle = tokio::spawn(handle_events(handle.queue.subscribe_events()));

    // 命令行参数视为待上传的 ROM 文件
    let specs: Vec<UploadSpec> = std::env::args().skip(1).map(UploadSpec::new).collect();
    if !specs.is_empty() {
        let task_ids = handle.queue.add_files(specs).await?;
        println!("Queued {} files from the command line", task_ids.len());
    }

    print_help();
    interactive_loop(&client, &mut config, &session, &handle.queue, entries, filter, sort).await?;

    session.stop().await;
    handle.shutdown().await?;
    let _ = printer_handle.await;

    Ok(())
}

fn print_help() {
    println!("Keys: [u] upload all, [s] scan, [l] queue, [c] clear done, [g] reload, [o] sort, [w] who, [t] theme, [q] quit");
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }

    Ok(line)
}

/// 登录关卡，成功之前不放行
///
/// 输入 delete 走删号流程，删完回到登录
async fn login_gate(client: &ApiClient, config: &mut AppConfig) -> Result<String> {
    match auth::previous_usernames(client).await {
        Ok(usernames) if !usernames.is_empty() => {
            println!("Previous users: {}", usernames.join(", "));
        }
        Ok(_) => {}
        Err(err) => tracing::debug!("Previous usernames unavailable: {}", err),
    }

    loop {
        let username = prompt("Username (or 'delete' to remove an account): ")?;

        if username == "delete" {
            let username = prompt("Account to delete: ")?;
            let password = prompt("Password: ")?;
            match auth::delete_account(client, &Credentials::new(username, password)).await {
                Ok(message) => {
                    println!("{}", message);
                    auth::logout(config);
                }
                Err(err) => println!("{}", err),
            }
            continue;
        }

        let password = prompt("Password: ")?;
        match auth::login(client, config, &Credentials::new(username, password)).await {
            Ok(username) => {
                println!("Logged in as {}", username);
                return Ok(username);
            }
            Err(err) => println!("{}", err),
        }
    }
}

fn print_catalog(entries: &[GameEntry], filter: &CatalogFilter, sort: CatalogSort) {
    let visible = filter_and_sort(entries, filter, sort);
    println!("============== Library ({}, {}) ==============", visible.len(), sort);
    for entry in &visible {
        let size = match entry.game.file_size {
            Some(bytes) => format_bytes(bytes.max(0) as u64),
            None => "unknown size".to_string(),
        };
        println!(
            "{} [{}] via {}, {}, {}",
            entry.game.title, entry.game.system, entry.emulator.name, size, entry.launch_url
        );
    }
}

/// 进入 raw mode，Drop 时还原终端
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// 刷新目录，拉取失败只提示一行，旧列表继续用
async fn reload_catalog(
    client: &ApiClient,
    entries: &mut Vec<GameEntry>,
    filter: &CatalogFilter,
    sort: CatalogSort,
) {
    match client.games().await {
        Ok(latest) => {
            *entries = latest;
            print_catalog(entries, filter, sort);
        }
        Err(err) => println!("Failed to reload games: {}", err),
    }
}

/// 切换主题，写盘失败只提示，内存里的主题照样切换
fn toggle_theme(config: &mut AppConfig) {
    let theme = config.theme.toggle();
    match config.set_theme(theme) {
        Ok(()) => println!("Theme: {}", theme),
        Err(err) => println!("Theme: {} (not saved: {})", theme, err),
    }
}

async fn interactive_loop(
    client: &ApiClient,
    config: &mut AppConfig,
    session: &Session,
    queue: &UploadQueue,
    mut entries: Vec<GameEntry>,
    filter: CatalogFilter,
    mut sort: CatalogSort,
) -> Result<()> {
    let _guard = RawModeGuard::enter()?;

    loop {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                if kind != KeyEventKind::Press {
                    continue;
                }

                match code {
                    KeyCode::Char('q') => {
                        println!("Quitting...");
                        break;
                    }
                    KeyCode::Char('u') => {
                        let started = queue.upload_all().await?;
                        if started == 0 {
                            println!("Nothing to upload");
                        } else {
                            println!("Uploading {} queued files", started);
                        }
                    }
                    KeyCode::Char('s') => {
                        if queue.scan().await? {
                            println!("Scan started");
                        } else {
                            println!("Scan already running");
                        }
                    }
                    KeyCode::Char('l') => {
                        let tasks = queue.tasks().await?;
                        println!("============== Upload Queue ==============");
                        for task in tasks {
                            println!(
                                "ID: {}, File: {}, Status: {:?}, Progress: {}%",
                                task.id, task.file_name, task.status, task.progress
                            );
                        }
                        println!("==========================================");
                    }
                    KeyCode::Char('c') => {
                        let removed = queue.clear_completed().await?;
                        println!("Removed {} completed tasks", removed);
                    }
                    KeyCode::Char('g') => {
                        reload_catalog(client, &mut entries, &filter, sort).await;
                    }
                    KeyCode::Char('o') => {
                        sort = sort.cycle();
                        print_catalog(&entries, &filter, sort);
                    }
                    KeyCode::Char('w') => {
                        let users = session.roster();
                        println!("{}", roster_header(users.len()));
                        for line in render_roster(&users) {
                            println!("{}", line);
                        }
                    }
                    KeyCode::Char('t') => {
                        toggle_theme(config);
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

async fn handle_events(mut event_rx: broadcast::Receiver<QueueEvent>) {
    while let Ok(event) = event_rx.recv().await {
        match event {
            QueueEvent::TaskAdded { task_id } => {
                println!("Task {}: queued", task_id);
            }
            QueueEvent::StatusChanged { task_id, old_status, new_status } => {
                println!("Task {}: {:?} -> {:?}", task_id, old_status, new_status);
            }
            QueueEvent::Progress { task_id, uploaded, total, percentage } => {
                println!(
                    "Task {}: {}% ({} / {})",
                    task_id,
                    percentage,
                    format_bytes(uploaded),
                    format_bytes(total)
                );
            }
            QueueEvent::TaskCompleted { task_id, message } => {
                println!("Task {}: completed: {}", task_id, message);
            }
            QueueEvent::TaskFailed { task_id, error } => {
                println!("Task {}: failed: {}", task_id, error);
            }
            QueueEvent::ScanFinished { outcome } => {
                println!(
                    "Scan finished: {} found, {} new, {} known, {} errors",
                    outcome.total_found,
                    outcome.newly_added,
                    outcome.already_exists,
                    outcome.errors.len()
                );
            }
            QueueEvent::AllCompleted { total, succeeded, failed } => {
                println!("Batch finished: {} uploads, {} succeeded, {} failed", total, succeeded, failed);
            }
        }
    }
}
